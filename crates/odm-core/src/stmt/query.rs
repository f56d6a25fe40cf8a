use super::{GroupOp, Operator, Value};
use crate::Result;

use std::{fmt, ops};

/// A filter over stored documents.
///
/// Queries are built from predicates and combined with `&`, `|` and `!`.
/// Combining two groups of the same kind flattens them into one group, so
/// `a & b & c` is a single conjunction of three predicates.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Predicate(Predicate),
    Group(Group),
}

/// `attribute <op> argument`
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub attribute: String,
    pub op: Operator,
    pub argument: Value,
}

/// A logical combination of queries. A `Not` group wraps exactly one node.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub op: GroupOp,
    pub nodes: Vec<Query>,
}

impl Query {
    pub fn new(attribute: impl Into<String>, op: Operator, argument: impl Into<Value>) -> Self {
        Self::Predicate(Predicate {
            attribute: attribute.into(),
            op,
            argument: argument.into(),
        })
    }

    /// Builds a predicate from an operator name such as `"gte"` or `"nin"`.
    pub fn parse(
        attribute: impl Into<String>,
        op: &str,
        argument: impl Into<Value>,
    ) -> Result<Self> {
        Ok(Self::new(attribute, op.parse()?, argument))
    }

    pub fn eq(attribute: impl Into<String>, argument: impl Into<Value>) -> Self {
        Self::new(attribute, Operator::Eq, argument)
    }

    pub fn ne(attribute: impl Into<String>, argument: impl Into<Value>) -> Self {
        Self::new(attribute, Operator::Ne, argument)
    }

    pub fn gt(attribute: impl Into<String>, argument: impl Into<Value>) -> Self {
        Self::new(attribute, Operator::Gt, argument)
    }

    pub fn ge(attribute: impl Into<String>, argument: impl Into<Value>) -> Self {
        Self::new(attribute, Operator::Ge, argument)
    }

    pub fn lt(attribute: impl Into<String>, argument: impl Into<Value>) -> Self {
        Self::new(attribute, Operator::Lt, argument)
    }

    pub fn le(attribute: impl Into<String>, argument: impl Into<Value>) -> Self {
        Self::new(attribute, Operator::Le, argument)
    }

    pub fn in_list(attribute: impl Into<String>, argument: impl Into<Value>) -> Self {
        Self::new(attribute, Operator::In, argument)
    }

    pub fn not_in_list(attribute: impl Into<String>, argument: impl Into<Value>) -> Self {
        Self::new(attribute, Operator::NotIn, argument)
    }

    pub fn and(nodes: impl IntoIterator<Item = Query>) -> Self {
        Self::group(GroupOp::And, nodes)
    }

    pub fn or(nodes: impl IntoIterator<Item = Query>) -> Self {
        Self::group(GroupOp::Or, nodes)
    }

    pub fn not(node: Query) -> Self {
        Self::Group(Group {
            op: GroupOp::Not,
            nodes: vec![node],
        })
    }

    fn group(op: GroupOp, nodes: impl IntoIterator<Item = Query>) -> Self {
        let mut flat = vec![];
        for node in nodes {
            match node {
                Query::Group(group) if group.op == op => flat.extend(group.nodes),
                node => flat.push(node),
            }
        }
        Self::Group(Group { op, nodes: flat })
    }

    pub fn as_predicate(&self) -> Option<&Predicate> {
        match self {
            Self::Predicate(predicate) => Some(predicate),
            Self::Group(_) => None,
        }
    }

    /// Visits every predicate in the tree, depth first.
    pub fn predicates(&self) -> Vec<&Predicate> {
        let mut out = vec![];
        self.collect_predicates(&mut out);
        out
    }

    fn collect_predicates<'a>(&'a self, out: &mut Vec<&'a Predicate>) {
        match self {
            Self::Predicate(predicate) => out.push(predicate),
            Self::Group(group) => {
                for node in &group.nodes {
                    node.collect_predicates(out);
                }
            }
        }
    }

    /// Rewrites every predicate argument with `f`, preserving the tree shape.
    pub fn try_map_predicates(
        &self,
        f: &mut impl FnMut(&Predicate) -> Result<Value>,
    ) -> Result<Query> {
        Ok(match self {
            Self::Predicate(predicate) => Self::Predicate(Predicate {
                attribute: predicate.attribute.clone(),
                op: predicate.op,
                argument: f(predicate)?,
            }),
            Self::Group(group) => Self::Group(Group {
                op: group.op,
                nodes: group
                    .nodes
                    .iter()
                    .map(|node| node.try_map_predicates(f))
                    .collect::<Result<_>>()?,
            }),
        })
    }
}

impl ops::BitAnd for Query {
    type Output = Query;

    fn bitand(self, rhs: Query) -> Query {
        Query::and([self, rhs])
    }
}

impl ops::BitOr for Query {
    type Output = Query;

    fn bitor(self, rhs: Query) -> Query {
        Query::or([self, rhs])
    }
}

impl ops::Not for Query {
    type Output = Query;

    fn not(self) -> Query {
        Query::not(self)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Predicate(p) => write!(f, "{} {} {}", p.attribute, p.op, p.argument),
            Self::Group(group) if group.op == GroupOp::Not => match group.nodes.first() {
                Some(node) => write!(f, "not ({node})"),
                None => f.write_str("not ()"),
            },
            Self::Group(group) => {
                f.write_str("(")?;
                for (i, node) in group.nodes.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", group.op)?;
                    }
                    write!(f, "{node}")?;
                }
                f.write_str(")")
            }
        }
    }
}
