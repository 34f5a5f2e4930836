//! The capability grammar, one rule per function:
//!
//! ```text
//! caps      := grant ( separator grant )*
//! separator := ws* ("," | ";") ws*
//! grant     := "allow" capspec cap_match?
//! capspec   := ws+ ( "*" | "rw" | "r" )
//! cap_match := (uid gidlist) | (path uid gidlist) | path
//! path      := ws+ "path" "=" ( quoted_path | unquoted_path )
//! uid       := ws+ "uid" "=" uint
//! gidlist   := ( ws+ "gids" "=" uint ("," uint)* )?
//! ```
//!
//! Alternative order inside `cap_match` is load bearing: `uid gidlist`
//! is tried first, then `path uid gidlist` with backtracking so a path
//! clause followed by `uid=` is never accepted as a bare path. A
//! `gids=` clause with no preceding `uid=` satisfies no alternative and
//! is left unconsumed, which fails the full-consumption check in
//! [`parse_caps`].

pub mod util;

use nom::branch::alt;
use nom::bytes::complete::{tag, take_while, take_while1};
use nom::character::complete::char;
use nom::character::complete::u32 as uint;
use nom::combinator::{map, opt, value};
use nom::error::context;
use nom::multi::separated_list1;
use nom::sequence::{delimited, pair, preceded, tuple};

use crate::caps::{CapGrant, CapMatch, CapSpec};
use crate::err::CapsErr;
use crate::parse::util::{is_cap_space, new_span, spaces, spaces0, Res, Span};

fn is_path_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-' || c == '/'
}

pub fn quoted_path<'a>(input: Span<'a>) -> Res<'a, String> {
    context(
        "quoted_path",
        alt((
            delimited(char('"'), take_while(|c: char| c != '"'), char('"')),
            delimited(char('\''), take_while(|c: char| c != '\''), char('\'')),
        )),
    )(input)
    .map(|(next, path)| (next, path.fragment().to_string()))
}

pub fn unquoted_path<'a>(input: Span<'a>) -> Res<'a, String> {
    context("unquoted_path", take_while1(is_path_char))(input)
        .map(|(next, path)| (next, path.fragment().to_string()))
}

pub fn path<'a>(input: Span<'a>) -> Res<'a, String> {
    context(
        "path",
        preceded(
            tuple((spaces, tag("path"), char('='))),
            alt((quoted_path, unquoted_path)),
        ),
    )(input)
}

pub fn uid<'a>(input: Span<'a>) -> Res<'a, u32> {
    context("uid", preceded(tuple((spaces, tag("uid"), char('='))), uint))(input)
}

pub fn uintlist<'a>(input: Span<'a>) -> Res<'a, Vec<u32>> {
    separated_list1(char(','), uint)(input)
}

pub fn gidlist<'a>(input: Span<'a>) -> Res<'a, Vec<u32>> {
    opt(preceded(
        tuple((spaces, tag("gids"), char('='))),
        uintlist,
    ))(input)
    .map(|(next, gids)| (next, gids.unwrap_or_default()))
}

pub fn cap_match<'a>(input: Span<'a>) -> Res<'a, CapMatch> {
    context(
        "cap_match",
        opt(alt((
            map(pair(uid, gidlist), |(uid, gids)| {
                CapMatch::new(None, Some(uid), gids)
            }),
            map(tuple((path, uid, gidlist)), |(path, uid, gids)| {
                CapMatch::new(Some(path), Some(uid), gids)
            }),
            map(path, |path| CapMatch::new(Some(path), None, vec![])),
        ))),
    )(input)
    .map(|(next, cap_match)| (next, cap_match.unwrap_or_else(CapMatch::match_all)))
}

pub fn capspec<'a>(input: Span<'a>) -> Res<'a, CapSpec> {
    context(
        "capspec",
        preceded(
            spaces,
            alt((
                value(CapSpec::any(), tag("*")),
                value(CapSpec::rw(), tag("rw")),
                value(CapSpec::read_only(), tag("r")),
            )),
        ),
    )(input)
}

pub fn grant<'a>(input: Span<'a>) -> Res<'a, CapGrant> {
    context("grant", preceded(tag("allow"), pair(capspec, cap_match)))(input)
        .map(|(next, (spec, scope))| (next, CapGrant::new(spec, scope)))
}

fn separator<'a>(input: Span<'a>) -> Res<'a, ()> {
    delimited(spaces0, alt((char(','), char(';'))), spaces0)(input).map(|(next, _)| (next, ()))
}

pub fn grants<'a>(input: Span<'a>) -> Res<'a, Vec<CapGrant>> {
    separated_list1(separator, grant)(input)
}

pub fn caps<'a>(input: Span<'a>) -> Res<'a, Vec<CapGrant>> {
    delimited(spaces0, grants, spaces0)(input)
}

/// Compile a capability string into its grant sequence.
///
/// The exact string `allow` predates the grammar (which requires an
/// explicit spec token) and is handled before it: one read/write grant
/// over everything.
///
/// The grammar must consume the entire input; leftover text fails the
/// parse and the error carries the unconsumed remainder verbatim.
pub fn parse_caps(input: &str) -> Result<Vec<CapGrant>, CapsErr> {
    if input == "allow" {
        return Ok(vec![CapGrant::new(CapSpec::rw(), CapMatch::match_all())]);
    }

    match caps(new_span(input)) {
        Ok((rest, grants)) if rest.fragment().is_empty() => Ok(grants),
        Ok((rest, _)) => Err(CapsErr::parse(rest.fragment(), input)),
        Err(_) => Err(CapsErr::parse(input.trim_start_matches(is_cap_space), input)),
    }
}
