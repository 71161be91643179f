use super::error::TreeError;
use super::node::NodeId;
use super::tree::Tree;
use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, take_while},
    character::complete::{char, digit1, multispace0},
    combinator::{cut, map, map_res, opt, recognize},
    error::{context, ContextError, ErrorKind, FromExternalError, ParseError},
    multi::{many0, separated_list1},
    sequence::{delimited, preceded},
    IResult, Offset, Parser,
};

// ================================================================================================
// Error Handling Structures
// ================================================================================================

#[derive(Clone, Debug, PartialEq)]
pub enum DetailedErrorKind {
    Context(&'static str),
    Nom(ErrorKind),
}

/// A custom error type for nom that accumulates context and error kinds.
#[derive(Clone, Debug, PartialEq)]
pub struct DetailedError<'a> {
    pub errors: Vec<(&'a str, DetailedErrorKind)>,
}

impl<'a> ParseError<&'a str> for DetailedError<'a> {
    fn from_error_kind(input: &'a str, kind: ErrorKind) -> Self {
        DetailedError {
            errors: vec![(input, DetailedErrorKind::Nom(kind))],
        }
    }

    fn append(input: &'a str, kind: ErrorKind, mut other: Self) -> Self {
        other.errors.push((input, DetailedErrorKind::Nom(kind)));
        other
    }
}

impl<'a> ContextError<&'a str> for DetailedError<'a> {
    fn add_context(input: &'a str, ctx: &'static str, mut other: Self) -> Self {
        other.errors.push((input, DetailedErrorKind::Context(ctx)));
        other
    }
}

impl<'a, E> FromExternalError<&'a str, E> for DetailedError<'a> {
    fn from_external_error(input: &'a str, kind: ErrorKind, _e: E) -> Self {
        DetailedError {
            errors: vec![(input, DetailedErrorKind::Nom(kind))],
        }
    }
}

// ================================================================================================
// Intermediate Structure
// ================================================================================================

/// Recursive form of a parsed subtree, converted into the `Tree` arena once
/// the whole input is read.
#[derive(Debug, Default)]
struct ParsedNode {
    name: Option<String>,
    length: Option<f64>,
    children: Vec<ParsedNode>,
}

impl ParsedNode {
    /// Adds this subtree to `tree`, children first. Returns the new node's ID.
    ///
    /// With `restore_heights`, an internal node sits at `child.height + child.length`
    /// and both children must agree on it. Otherwise every height is 0.
    fn into_tree(self, tree: &mut Tree, restore_heights: bool) -> Result<NodeId, TreeError> {
        match self.children.len() {
            0 => {
                let name = self.name.ok_or_else(|| {
                    TreeError::LogicError("A leaf has no name".to_string())
                })?;
                Ok(tree.add_leaf(name, 0))
            }
            2 => {
                let mut ids = [0; 2];
                let mut heights = [0i64; 2];
                for (k, child) in self.children.into_iter().enumerate() {
                    let length = child.length;
                    let id = child.into_tree(tree, restore_heights)?;
                    ids[k] = id;
                    if restore_heights {
                        heights[k] = parent_height(tree, id, length)?;
                    }
                }

                if heights[0] != heights[1] {
                    return Err(TreeError::LogicError(format!(
                        "Children of one node imply heights {} and {}",
                        heights[0], heights[1]
                    )));
                }
                let height = i32::try_from(heights[0]).map_err(|_| {
                    TreeError::LogicError(format!("Height {} is out of range", heights[0]))
                })?;

                tree.add_internal(ids[0], ids[1], height)
            }
            n => Err(TreeError::LogicError(format!(
                "A node has {} children, expected 2",
                n
            ))),
        }
    }
}

/// Height of the parent of `id`, given the length of the edge between them.
fn parent_height(tree: &Tree, id: NodeId, length: Option<f64>) -> Result<i64, TreeError> {
    let node = tree
        .get_node(id)
        .ok_or_else(|| TreeError::LogicError(format!("Node {} not found", id)))?;
    let label = node.name().unwrap_or("an internal node");

    let length = length.ok_or_else(|| {
        TreeError::LogicError(format!("No branch length for {}", label))
    })?;
    if length.fract() != 0.0 || length.abs() > f64::from(u32::MAX) {
        return Err(TreeError::LogicError(format!(
            "Branch length {} of {} is not an integer score difference",
            length, label
        )));
    }

    Ok(i64::from(node.height) + length as i64)
}

// ================================================================================================
// Parsers
// ================================================================================================

// 1. Whitespace eater
fn ws<'a, F, O, E>(inner: F) -> impl Parser<&'a str, Output = O, Error = E>
where
    F: Parser<&'a str, Output = O, Error = E>,
    E: ParseError<&'a str>,
{
    delimited(multispace0, inner, multispace0)
}

// 2. Label
// - Unquoted strings stop at "():;,[]" and are trimmed
// - Single quoted strings keep everything, '' is an escaped quote: 'O''Brien' -> O'Brien
fn parse_label(input: &str) -> IResult<&str, String, DetailedError<'_>> {
    let unquoted = map(take_while(|c: char| !"():;,[]".contains(c)), |s: &str| {
        s.trim().to_string()
    });

    let single_quoted = delimited(
        char('\''),
        map(
            recognize(many0(alt((is_not("'"), tag("''"))))),
            |s: &str| s.replace("''", "'"),
        ),
        char('\''),
    );

    context("label", alt((ws(single_quoted), unquoted))).parse(input)
}

// 3. Length
// ":5", ":-6", also floats so that a fractional length is reported instead of
// a syntax error.
fn parse_length(input: &str) -> IResult<&str, f64, DetailedError<'_>> {
    context(
        "length",
        preceded(
            ws(char(':')),
            cut(map_res(
                recognize((
                    opt(alt((char('+'), char('-')))),
                    digit1,
                    opt((char('.'), digit1)),
                    opt((
                        alt((char('e'), char('E'))),
                        opt(alt((char('+'), char('-')))),
                        digit1,
                    )),
                )),
                |s: &str| s.parse::<f64>(),
            )),
        ),
    )
    .parse(input)
}

// 4. Comment
// [anything but a closing bracket], discarded
fn parse_comment(input: &str) -> IResult<&str, (), DetailedError<'_>> {
    let comment = delimited(ws(char('[')), is_not("]"), ws(char(']')));
    context("comment", map(opt(comment), |_| ())).parse(input)
}

// 5. Subtree
// (child1,child2)Label[Comment]:Length[Comment]
fn parse_subtree(input: &str) -> IResult<&str, ParsedNode, DetailedError<'_>> {
    let (input, children) = context(
        "children",
        opt(delimited(
            ws(char('(')),
            separated_list1(ws(char(',')), parse_subtree),
            ws(char(')')),
        )),
    )
    .parse(input)?;

    let (input, label) = opt(parse_label).parse(input)?;
    let (input, _) = parse_comment(input)?;
    let (input, length) = opt(parse_length).parse(input)?;
    let (input, _) = parse_comment(input)?;

    let node = ParsedNode {
        name: label.filter(|l| !l.is_empty()),
        length,
        children: children.unwrap_or_default(),
    };

    Ok((input, node))
}

// ================================================================================================
// Entry Points
// ================================================================================================

fn parse_root(input: &str) -> Result<ParsedNode, TreeError> {
    let mut parser = (ws(parse_subtree), ws(char(';')));

    match parser.parse(input) {
        Ok((_, (root_node, _))) => Ok(root_node),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(make_tree_error(input, e)),
        Err(nom::Err::Incomplete(_)) => Err(TreeError::ParseError {
            message: "Incomplete input".to_string(),
            line: 0,
            column: 0,
            snippet: "".to_string(),
        }),
    }
}

/// Parses a single binary Newick tree. Every height is 0.
pub fn parse_newick(input: &str) -> Result<Tree, TreeError> {
    build_tree(parse_root(input)?, false)
}

/// Parses a single binary Newick tree with integer branch lengths, restoring
/// node heights with leaves at 0.
pub fn parse_distance_newick(input: &str) -> Result<Tree, TreeError> {
    build_tree(parse_root(input)?, true)
}

fn build_tree(root_node: ParsedNode, restore_heights: bool) -> Result<Tree, TreeError> {
    let mut tree = Tree::new();
    let root_id = root_node.into_tree(&mut tree, restore_heights)?;
    tree.set_root(root_id)?;
    Ok(tree)
}

// Helper to convert nom errors into friendly TreeError
fn make_tree_error(input: &str, e: DetailedError) -> TreeError {
    let remaining = match e.errors.first() {
        Some((remaining, _)) => *remaining,
        None => input,
    };
    let offset = input.offset(remaining);

    // Calculate line/col
    let prefix = &input[..offset];
    let line = prefix.chars().filter(|&c| c == '\n').count() + 1;
    let last_newline = prefix.rfind('\n').map(|p| p + 1).unwrap_or(0);
    let column = offset - last_newline + 1;

    let mut msg = String::new();
    for (_, kind) in e.errors.iter().rev() {
        match kind {
            DetailedErrorKind::Context(ctx) => {
                msg.push_str(&format!("while parsing {}:\n", ctx));
            }
            DetailedErrorKind::Nom(k) => {
                msg.push_str(&format!("  error: {:?}\n", k));
            }
        }
    }

    TreeError::ParseError {
        message: msg,
        line,
        column,
        snippet: remaining.chars().take(50).collect(),
    }
}

impl Tree {
    /// Parse a binary Newick string into a Tree. Branch lengths, internal
    /// labels and comments are accepted and ignored.
    ///
    /// # Example
    /// ```
    /// use nwclust::libs::phylo::Tree;
    ///
    /// let tree = Tree::from_newick("((A,B),C);").unwrap();
    /// assert_eq!(tree.len(), 5);
    /// assert_eq!(tree.get_leaf_names(), vec!["A", "B", "C"]);
    ///
    /// // Non-binary trees are rejected
    /// assert!(Tree::from_newick("(A,B,C);").is_err());
    /// ```
    pub fn from_newick(input: &str) -> Result<Self, TreeError> {
        parse_newick(input)
    }

    /// Parse a Newick string written by [`Tree::to_distance_newick`] from a
    /// tree whose leaves sit at 0, and restore every node's height.
    ///
    /// ```
    /// use nwclust::libs::phylo::Tree;
    ///
    /// let tree = Tree::from_distance_newick("((X:10,Y:10):-6,Z:4);").unwrap();
    /// let root = tree.get_node(tree.get_root().unwrap()).unwrap();
    /// assert_eq!(root.height, 4);
    /// assert_eq!(tree.to_distance_newick(), "((X:10,Y:10):-6,Z:4);");
    /// ```
    pub fn from_distance_newick(input: &str) -> Result<Self, TreeError> {
        parse_distance_newick(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::similarity::SimilarityTable;
    use indexmap::IndexMap;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_parser_simple() {
        let tree = Tree::from_newick("(A,B);").unwrap();
        assert_eq!(tree.len(), 3);

        let root = tree.get_node(tree.get_root().unwrap()).unwrap();
        assert_eq!(root.children().len(), 2);
        assert_eq!(root.height, 0);
        let a = tree.get_node(root.children()[0]).unwrap();
        assert_eq!(a.name(), Some("A"));
    }

    #[test]
    fn test_parser_ignores_extras() {
        // internal labels, lengths and comments are dropped
        let tree = Tree::from_newick("((A:0.1,B[x=1]:0.2)AB,C)Root:100;").unwrap();
        assert_eq!(tree.to_topology_newick(), "((A,B),C);");
    }

    #[test]
    fn test_parser_whitespace() {
        let input = "
        (
            ( A : 10 ,
              B : 10 ) : -6 ,
            C : 4
        ) ;
        ";
        let tree = Tree::from_distance_newick(input).unwrap();
        assert_eq!(tree.to_distance_newick(), "((A:10,B:10):-6,C:4);");
    }

    #[test]
    fn test_parser_quoted() {
        let input = "('Homo sapiens','O''Brien');";
        let tree = Tree::from_newick(input).unwrap();
        assert_eq!(tree.get_leaf_names(), vec!["Homo sapiens", "O'Brien"]);
        assert_eq!(tree.to_topology_newick(), input);
    }

    #[test]
    fn test_parser_single_leaf() {
        let tree = Tree::from_distance_newick("A;").unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.to_distance_newick(), "A;");
    }

    #[test]
    fn test_restore_heights() {
        let tree = Tree::from_distance_newick("(X:4,(Y:10,Z:10):-6);").unwrap();
        let root = tree.get_node(tree.get_root().unwrap()).unwrap();
        assert_eq!(root.height, 4);
        let yz = tree.get_node(root.children()[1]).unwrap();
        assert_eq!(yz.height, 10);
    }

    #[test]
    fn test_distance_errors() {
        // children disagree
        let res = Tree::from_distance_newick("(A:1,B:2);");
        assert!(matches!(res, Err(TreeError::LogicError(_))));

        // fractional length
        let res = Tree::from_distance_newick("(A:1.5,B:1.5);");
        assert!(matches!(res, Err(TreeError::LogicError(_))));

        // missing length
        let res = Tree::from_distance_newick("(A,B:1);");
        assert!(matches!(res, Err(TreeError::LogicError(_))));

        // topology only is fine without lengths
        assert!(Tree::from_newick("(A,B:1);").is_ok());
    }

    #[test]
    fn test_shape_errors() {
        let res = Tree::from_newick("(A,B,C);");
        assert!(matches!(res, Err(TreeError::LogicError(_))));

        let res = Tree::from_newick("((A),B);");
        assert!(matches!(res, Err(TreeError::LogicError(_))));

        let res = Tree::from_newick("(A,);");
        assert!(matches!(res, Err(TreeError::LogicError(_))));
    }

    #[test]
    fn test_parser_error() {
        // Case 1: Missing semicolon
        let input = "(A,B)";
        let res = Tree::from_newick(input);
        match res {
            Err(TreeError::ParseError { line, column, .. }) => {
                assert_eq!(line, 1);
                assert_eq!(column, 6);
            }
            _ => panic!("Expected ParseError, got {:?}", res),
        }

        // Case 2: Invalid length
        let input2 = "(A,B:invalid);";
        let res2 = Tree::from_newick(input2);
        match res2 {
            Err(TreeError::ParseError { line, message, .. }) => {
                assert_eq!(line, 1);
                assert!(message.contains("length"));
            }
            _ => panic!("Expected ParseError, got {:?}", res2),
        }
    }

    #[test]
    fn test_round_trip_random_trees() {
        let mut rng = SmallRng::seed_from_u64(23);
        for k in 1..16 {
            let ids: Vec<String> = (0..k).map(|i| format!("seq_{}", i)).collect();
            let mut flat = IndexMap::new();
            for i in 0..k {
                for j in (i + 1)..k {
                    flat.insert(format!("{}_{}", ids[i], ids[j]), rng.gen_range(-50..50));
                }
            }
            let table = SimilarityTable::from_flat(ids.iter().cloned(), &flat).unwrap();
            let tree = Tree::from_similarity(&table).unwrap();

            let topology = tree.to_topology_newick();
            assert_eq!(Tree::from_newick(&topology).unwrap().to_topology_newick(), topology);

            let distance = tree.to_distance_newick();
            let restored = Tree::from_distance_newick(&distance).unwrap();
            assert_eq!(restored.to_distance_newick(), distance);
            // arena IDs differ, so walk both trees in the same order
            let heights = |t: &Tree| -> Vec<i32> {
                t.preorder(t.get_root().unwrap())
                    .into_iter()
                    .map(|id| t.get_node(id).unwrap().height)
                    .collect()
            };
            assert_eq!(heights(&restored), heights(&tree));
        }
    }
}
