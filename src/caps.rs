//! The capability model and the decision procedure.
//!
//! [`AuthCaps`] owns the parsed grant sequence wholesale: it is filled
//! by [`AuthCaps::parse`] on success, emptied on failure, and read by
//! [`AuthCaps::is_capable`]. Nothing mutates it grant by grant.

use core::fmt;
use std::fmt::{Display, Formatter, Write};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::err::CapsErr;
use crate::parse::parse_caps;

/// Permission mask bits of the calling system. A request mask is any
/// combination of these.
pub const MAY_READ: u32 = 1;
pub const MAY_WRITE: u32 = 2;
pub const MAY_EXECUTE: u32 = 4;

/// The permission side of a grant. Only three forms are constructible,
/// matching the three spec tokens of the grammar: `*`, `rw` and `r`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash)]
pub struct CapSpec {
    pub any: bool,
    pub read: bool,
    pub write: bool,
}

impl CapSpec {
    /// The `*` spec: unrestricted regardless of the read/write flags.
    pub fn any() -> Self {
        Self {
            any: true,
            read: true,
            write: true,
        }
    }

    /// The `rw` spec.
    pub fn rw() -> Self {
        Self {
            any: false,
            read: true,
            write: true,
        }
    }

    /// The `r` spec. There is no standalone `w` form.
    pub fn read_only() -> Self {
        Self {
            any: false,
            read: true,
            write: false,
        }
    }

    pub fn allow_all(&self) -> bool {
        self.any
    }

    /// True when every permission actually requested is covered by this
    /// spec. The arguments are the requested bits, not the granted ones:
    /// a bit that was not requested never blocks the grant.
    pub fn allows(&self, read_or_exec: bool, write: bool) -> bool {
        if self.any {
            return true;
        }
        (!read_or_exec || self.read) && (!write || self.write)
    }
}

impl Display for CapSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.any {
            write!(f, "*")
        } else {
            if self.read {
                write!(f, "r")?;
            }
            if self.write {
                write!(f, "w")?;
            }
            Ok(())
        }
    }
}

/// The scope side of a grant: which paths and which requesters it
/// applies to.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct CapMatch {
    /// Scope path with leading separators stripped; empty matches any
    /// path.
    pub path: String,
    /// Uid constraint; `None` matches any requester.
    pub uid: Option<u32>,
    /// Gid constraints, only meaningful alongside `uid`. Stored and
    /// serialized but not yet consulted by [`CapMatch::matches`].
    pub gids: Vec<u32>,
}

impl CapMatch {
    pub fn match_all() -> Self {
        Self::default()
    }

    pub fn new(path: Option<String>, uid: Option<u32>, gids: Vec<u32>) -> Self {
        let mut cap_match = Self {
            path: path.unwrap_or_default(),
            uid,
            gids,
        };
        cap_match.normalize_path();
        cap_match
    }

    /// Drop any leading `/`. Duplicate `//` and `.`/`..` segments are
    /// left as-is.
    fn normalize_path(&mut self) {
        while self.path.starts_with('/') {
            self.path.remove(0);
        }
    }

    pub fn is_match_all(&self) -> bool {
        self.path.is_empty() && self.uid.is_none()
    }

    /// Whether this scope covers a request for `target_path` by
    /// `target_uid`. The path constraint is a literal prefix match with
    /// a boundary check so that `path=/foo` does not cover
    /// `target_path=/food`.
    pub fn matches(&self, target_path: &str, target_uid: u32) -> bool {
        if let Some(uid) = self.uid {
            if uid != target_uid {
                return false;
            }
        }
        if !self.path.is_empty() {
            if !target_path.starts_with(self.path.as_str()) {
                return false;
            }
            // if the scope path has no trailing /, the target must
            // continue with one for the prefix to end on a segment
            if target_path.len() > self.path.len()
                && !self.path.ends_with('/')
                && target_path.as_bytes()[self.path.len()] != b'/'
            {
                return false;
            }
        }
        true
    }
}

impl Display for CapMatch {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if !self.path.is_empty() {
            write!(f, "path=\"/{}\"", self.path)?;
            if self.uid.is_some() {
                write!(f, " ")?;
            }
        }
        if let Some(uid) = self.uid {
            write!(f, "uid={}", uid)?;
            if !self.gids.is_empty() {
                write!(f, " gids=")?;
                for (i, gid) in self.gids.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", gid)?;
                }
            }
        }
        Ok(())
    }
}

/// One permission/scope pair. Grant order inside a capability set has
/// no effect on the decision, only on which grant matches first.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct CapGrant {
    pub spec: CapSpec,
    pub scope: CapMatch,
}

impl CapGrant {
    pub fn new(spec: CapSpec, scope: CapMatch) -> Self {
        Self { spec, scope }
    }
}

impl Display for CapGrant {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "allow {}", self.spec)?;
        if !self.scope.is_match_all() {
            write!(f, " {}", self.scope)?;
        }
        Ok(())
    }
}

/// The parsed form of one capability string: an ordered grant sequence.
///
/// Created empty, replaced wholesale by [`AuthCaps::parse`] and read by
/// the decision methods. Not internally synchronized; publish a freshly
/// parsed set as a snapshot before sharing it across threads.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct AuthCaps {
    grants: Vec<CapGrant>,
}

impl AuthCaps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grants(&self) -> &[CapGrant] {
        &self.grants
    }

    /// Parse `input` and replace this set's grants with the result. On
    /// failure the set is left empty — a failed parse never leaves
    /// partial grants behind — and the diagnostic line is written to
    /// `diag` when a sink is supplied.
    pub fn parse(
        &mut self,
        input: &str,
        diag: Option<&mut dyn Write>,
    ) -> Result<(), CapsErr> {
        match parse_caps(input) {
            Ok(grants) => {
                self.grants = grants;
                Ok(())
            }
            Err(err) => {
                self.grants.clear();
                if let Some(diag) = diag {
                    let _ = writeln!(diag, "{}", err);
                }
                Err(err)
            }
        }
    }

    /// Whether some grant is unrestricted in both spec and scope.
    /// `allow * uid=1` does not qualify; only `allow *` does.
    pub fn allow_all(&self) -> bool {
        self.grants
            .iter()
            .any(|grant| grant.scope.is_match_all() && grant.spec.allow_all())
    }

    /// Administrative override: replace everything with one
    /// unrestricted grant. Not reachable through the grammar.
    pub fn set_allow_all(&mut self) {
        self.grants.clear();
        self.grants
            .push(CapGrant::new(CapSpec::any(), CapMatch::match_all()));
    }

    /// Decide a request: walk the grants in stored order and allow on
    /// the first one whose scope matches the request and whose spec
    /// covers the requested mask bits. No match means deny.
    ///
    /// `inode_uid`, `inode_gid` and `inode_mode` are carried so unix
    /// permission enforcement can be added without changing callers;
    /// they are not consulted yet.
    pub fn is_capable(
        &self,
        target_path: &str,
        inode_uid: u32,
        inode_gid: u32,
        inode_mode: u32,
        uid: u32,
        mask: u32,
    ) -> bool {
        debug!(
            "is_capable inode(path /{} owner {}:{} mode 0{:o}) by uid {} mask {}",
            target_path, inode_uid, inode_gid, inode_mode, uid, mask
        );
        for grant in &self.grants {
            if grant.scope.matches(target_path, uid)
                && grant.spec.allows(
                    mask & (MAY_READ | MAY_EXECUTE) != 0,
                    mask & MAY_WRITE != 0,
                )
            {
                // TODO enforce inode_mode for grants scoped by uid
                return true;
            }
        }
        false
    }
}

impl FromStr for AuthCaps {
    type Err = CapsErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self {
            grants: parse_caps(s)?,
        })
    }
}

impl Display for AuthCaps {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "AuthCaps[")?;
        for (i, grant) in self.grants.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", grant)?;
        }
        write!(f, "]")
    }
}
