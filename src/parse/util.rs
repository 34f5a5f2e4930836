use nom::bytes::complete::take_while1;
use nom::combinator::opt;
use nom::IResult;
use nom_locate::LocatedSpan;
use nom_supreme::error::ErrorTree;

pub type Span<'a> = LocatedSpan<&'a str>;

pub type Res<'a, O> = IResult<Span<'a>, O, ErrorTree<Span<'a>>>;

pub fn new_span(s: &str) -> Span {
    LocatedSpan::new(s)
}

/// The whitespace class of the capability grammar: space, tab, newline.
pub fn is_cap_space(c: char) -> bool {
    c == ' ' || c == '\t' || c == '\n'
}

pub fn spaces<'a>(input: Span<'a>) -> Res<'a, Span<'a>> {
    take_while1(is_cap_space)(input)
}

pub fn spaces0<'a>(input: Span<'a>) -> Res<'a, Option<Span<'a>>> {
    opt(spaces)(input)
}
