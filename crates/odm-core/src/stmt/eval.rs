use super::{Document, GroupOp, Operator, Predicate, Query, Value};
use crate::{Error, Result};

impl Query {
    /// Evaluates the query against a document in storage form.
    ///
    /// A missing attribute evaluates as null. Text operators match only
    /// string values. `eq` against a list attribute tests membership.
    pub fn matches(&self, document: &Document) -> Result<bool> {
        match self {
            Query::Predicate(predicate) => predicate.matches(document),
            Query::Group(group) => match group.op {
                GroupOp::And => {
                    for node in &group.nodes {
                        if !node.matches(document)? {
                            return Ok(false);
                        }
                    }
                    Ok(true)
                }
                GroupOp::Or => {
                    for node in &group.nodes {
                        if node.matches(document)? {
                            return Ok(true);
                        }
                    }
                    Ok(false)
                }
                GroupOp::Not => match &group.nodes[..] {
                    [node] => Ok(!node.matches(document)?),
                    nodes => Err(Error::unsupported(format!(
                        "`not` group must wrap exactly one node; found {}",
                        nodes.len()
                    ))),
                },
            },
        }
    }
}

impl Predicate {
    pub fn matches(&self, document: &Document) -> Result<bool> {
        let value = document.get(&self.attribute).unwrap_or(&Value::Null);
        let arg = &self.argument;

        Ok(match self.op {
            Operator::Eq => eq(value, arg),
            Operator::Ne => !eq(value, arg),
            Operator::Gt => value.partial_compare(arg).is_some_and(|o| o.is_gt()),
            Operator::Ge => value.partial_compare(arg).is_some_and(|o| o.is_ge()),
            Operator::Lt => value.partial_compare(arg).is_some_and(|o| o.is_lt()),
            Operator::Le => value.partial_compare(arg).is_some_and(|o| o.is_le()),
            Operator::In => self.candidates()?.iter().any(|c| eq(value, c)),
            Operator::NotIn => !self.candidates()?.iter().any(|c| eq(value, c)),
            op => text(op, value, self.text_argument()?),
        })
    }

    fn candidates(&self) -> Result<&[Value]> {
        self.argument.as_list().ok_or_else(|| {
            Error::type_conversion(self.argument.clone(), "List").context(crate::err!(
                "argument of `{}` on `{}`",
                self.op,
                self.attribute
            ))
        })
    }

    fn text_argument(&self) -> Result<&str> {
        self.argument.as_str().ok_or_else(|| {
            Error::type_conversion(self.argument.clone(), "String").context(crate::err!(
                "argument of `{}` on `{}`",
                self.op,
                self.attribute
            ))
        })
    }
}

fn eq(value: &Value, arg: &Value) -> bool {
    match value {
        Value::List(items) if !arg.is_list() => items.iter().any(|item| item.loose_eq(arg)),
        _ => value.loose_eq(arg),
    }
}

fn text(op: Operator, value: &Value, arg: &str) -> bool {
    let haystack = match value {
        Value::String(s) => s,
        Value::List(items) if op == Operator::Contains => {
            return items.iter().any(|item| item == &arg);
        }
        _ => return false,
    };

    let (haystack, needle) = if op.is_case_insensitive() {
        (haystack.to_lowercase(), arg.to_lowercase())
    } else {
        (haystack.clone(), arg.to_string())
    };

    match op {
        Operator::StartsWith | Operator::IStartsWith => haystack.starts_with(&needle),
        Operator::EndsWith | Operator::IEndsWith => haystack.ends_with(&needle),
        Operator::Contains | Operator::IContains => haystack.contains(&needle),
        _ => false,
    }
}
