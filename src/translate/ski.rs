//! Parenthesized SKI → Hof (§6.3), grounded on `original_source/src/ski.cpp`.
//!
//! `(f a b)` is a left-associated application of `f` to `a` then to `b`; it
//! compiles to `N-1` leading `A` markers (`N` = argument count) followed by
//! the recursively-translated children, e.g. `(S K I)` → `AASKI`. `{tok}`
//! substitutions pass their contents through verbatim. The original threads
//! this through a linked chain of raw `SkiSubTerm` pointers representing
//! "the currently open parenthesis"; here that's a plain stack of node
//! vectors — same left-to-right matching-parens structure, without the
//! manual pointer bookkeeping.

use super::{malformed, TranslateError};

#[derive(Debug, Clone)]
enum Node {
    Atom(String),
    Group { children: Vec<Node>, closed: bool },
}

/// Translates a parenthesized-SKI program into Hof source text.
pub fn translate(source: &str) -> Result<String, TranslateError> {
    let top = parse(source)?;
    let mut out = String::new();
    for node in &top {
        validate_top(node)?;
        render(node, &mut out);
    }
    Ok(out)
}

fn parse(source: &str) -> Result<Vec<Node>, TranslateError> {
    let mut stack: Vec<Vec<Node>> = vec![Vec::new()];
    let mut in_sub = false;
    let mut sub_buf = String::new();

    for ch in source.chars() {
        if in_sub {
            if ch == '}' {
                let tok = std::mem::take(&mut sub_buf);
                stack.last_mut().unwrap().push(Node::Atom(tok));
                in_sub = false;
            } else {
                sub_buf.push(ch);
            }
            continue;
        }
        match ch {
            '(' => stack.push(Vec::new()),
            ')' => {
                if stack.len() < 2 {
                    return Err(malformed("unmatched `)` in ski source"));
                }
                let children = stack.pop().unwrap();
                stack
                    .last_mut()
                    .unwrap()
                    .push(Node::Group { children, closed: true });
            }
            '{' => in_sub = true,
            'S' | 's' => stack.last_mut().unwrap().push(Node::Atom("S".to_string())),
            'K' | 'k' => stack.last_mut().unwrap().push(Node::Atom("K".to_string())),
            'I' | 'i' => stack.last_mut().unwrap().push(Node::Atom("I".to_string())),
            other => stack.last_mut().unwrap().push(Node::Atom(other.to_string())),
        }
    }

    if in_sub {
        return Err(malformed("unterminated `{...}` substitution"));
    }

    // Fold any still-open groups (unmatched `(`) up into their parent,
    // marked unclosed, so top-level validation below reports them instead
    // of silently dropping the trailing text.
    while stack.len() > 1 {
        let children = stack.pop().unwrap();
        stack
            .last_mut()
            .unwrap()
            .push(Node::Group { children, closed: false });
    }

    Ok(stack.pop().unwrap())
}

fn validate_top(node: &Node) -> Result<(), TranslateError> {
    match node {
        Node::Atom(s) if s.is_empty() => Err(malformed("empty substitution token")),
        Node::Atom(_) => Ok(()),
        Node::Group { children, closed } => {
            if !*closed {
                Err(malformed("unterminated application: missing `)`"))
            } else if children.len() < 2 {
                Err(malformed("application group needs at least two terms"))
            } else {
                Ok(())
            }
        }
    }
}

fn render(node: &Node, out: &mut String) {
    match node {
        Node::Atom(s) => out.push_str(s),
        Node::Group { children, .. } => {
            for _ in 1..children.len() {
                out.push('A');
            }
            for c in children {
                render(c, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_combinators_pass_through() {
        assert_eq!(translate("SKI").unwrap(), "SKI");
    }

    #[test]
    fn parenthesized_application_gets_left_folded() {
        // No whitespace: matching the original, a space is just another atom
        // (stripped only later, by the CLI's post-translation whitespace pass).
        assert_eq!(translate("(SKI)").unwrap(), "AASKI");
    }

    #[test]
    fn nested_parens_translate_recursively() {
        assert_eq!(translate("(S(KI)I)").unwrap(), "AASAKII");
    }

    #[test]
    fn substitution_token_passes_through_verbatim() {
        assert_eq!(translate("({AKI}K)").unwrap(), "AAKIK");
    }

    #[test]
    fn unmatched_close_paren_is_an_error() {
        assert!(translate("S)").is_err());
    }

    #[test]
    fn unterminated_group_is_an_error() {
        assert!(translate("(S K").is_err());
    }
}
