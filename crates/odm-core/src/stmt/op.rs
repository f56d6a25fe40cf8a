use crate::Error;

use std::{fmt, str::FromStr};

/// Comparison operator of a query predicate.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    In,
    NotIn,
    StartsWith,
    EndsWith,
    Contains,
    IStartsWith,
    IEndsWith,
    IContains,
}

/// Logical combinator of a query group.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum GroupOp {
    And,
    Or,
    Not,
}

impl Operator {
    pub fn is_eq(self) -> bool {
        matches!(self, Self::Eq)
    }

    /// Operators taking a list of candidate values as their argument.
    pub fn is_membership(self) -> bool {
        matches!(self, Self::In | Self::NotIn)
    }

    /// Operators matching on string content. Their arguments are never
    /// translated to storage form.
    pub fn is_text(self) -> bool {
        matches!(
            self,
            Self::StartsWith
                | Self::EndsWith
                | Self::Contains
                | Self::IStartsWith
                | Self::IEndsWith
                | Self::IContains
        )
    }

    pub fn is_case_insensitive(self) -> bool {
        matches!(self, Self::IStartsWith | Self::IEndsWith | Self::IContains)
    }

    pub fn as_str(self) -> &'static str {
        use Operator::*;

        match self {
            Eq => "eq",
            Ne => "ne",
            Gt => "gt",
            Ge => "gte",
            Lt => "lt",
            Le => "lte",
            In => "in",
            NotIn => "nin",
            StartsWith => "startswith",
            EndsWith => "endswith",
            Contains => "contains",
            IStartsWith => "istartswith",
            IEndsWith => "iendswith",
            IContains => "icontains",
        }
    }
}

impl FromStr for Operator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use Operator::*;

        Ok(match s {
            "eq" | "==" => Eq,
            "ne" | "!=" => Ne,
            "gt" | ">" => Gt,
            "gte" | ">=" => Ge,
            "lt" | "<" => Lt,
            "lte" | "<=" => Le,
            "in" => In,
            "nin" => NotIn,
            "startswith" => StartsWith,
            "endswith" => EndsWith,
            "contains" => Contains,
            "istartswith" => IStartsWith,
            "iendswith" => IEndsWith,
            "icontains" => IContains,
            _ => return Err(Error::unsupported(format!("unknown query operator `{s}`"))),
        })
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for GroupOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupOp::And => "and".fmt(f),
            GroupOp::Or => "or".fmt(f),
            GroupOp::Not => "not".fmt(f),
        }
    }
}
