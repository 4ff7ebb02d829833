//! Filter operator catalog
//!
//! The closed set of operators accepted in `filter[field][op]=value`.

use std::fmt;

/// Filter operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equals,
    Gt,
    Lt,
    Contains,
    In,
    Between,
    On,
    Before,
    After,
}

/// How many values an operator binds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    One,
    Two,
    /// One or more
    Many,
}

impl Operator {
    pub const ALL: [Operator; 9] = [
        Self::Equals,
        Self::Gt,
        Self::Lt,
        Self::Contains,
        Self::In,
        Self::Between,
        Self::On,
        Self::Before,
        Self::After,
    ];

    /// Look up an operator by its wire name
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == name)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::Gt => "gt",
            Self::Lt => "lt",
            Self::Contains => "contains",
            Self::In => "in",
            Self::Between => "between",
            Self::On => "on",
            Self::Before => "before",
            Self::After => "after",
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            Self::In => Arity::Many,
            Self::Between => Arity::Two,
            Self::Equals
            | Self::Gt
            | Self::Lt
            | Self::Contains
            | Self::On
            | Self::Before
            | Self::After => Arity::One,
        }
    }

    /// SQL keyword placed between column and placeholder
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Equals | Self::On => "=",
            Self::Gt | Self::After => ">",
            Self::Lt | Self::Before => "<",
            Self::Contains => "ILIKE",
            Self::In => "IN",
            Self::Between => "BETWEEN",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_every_known_name() {
        for op in Operator::ALL {
            assert_eq!(Operator::parse(op.as_str()), Some(op));
        }
    }

    #[test]
    fn parse_is_case_sensitive_and_closed() {
        assert_eq!(Operator::parse("EQUALS"), None);
        assert_eq!(Operator::parse("like"), None);
        assert_eq!(Operator::parse(""), None);
    }

    #[test]
    fn arity_table() {
        assert_eq!(Operator::In.arity(), Arity::Many);
        assert_eq!(Operator::Between.arity(), Arity::Two);
        assert_eq!(Operator::On.arity(), Arity::One);
    }

    #[test]
    fn date_operators_share_comparison_keywords() {
        assert_eq!(Operator::Before.keyword(), Operator::Lt.keyword());
        assert_eq!(Operator::After.keyword(), Operator::Gt.keyword());
        assert_eq!(Operator::Contains.keyword(), "ILIKE");
    }
}
