//! The ten result type codes of the DOM `XPathResult` interface.

use crate::error::Error;
use domxpath_xpath1::ValueKind;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ResultType {
    /// Whatever type the expression naturally produces.
    Any = 0,
    Number = 1,
    String = 2,
    Boolean = 3,
    UnorderedNodeIterator = 4,
    OrderedNodeIterator = 5,
    UnorderedNodeSnapshot = 6,
    OrderedNodeSnapshot = 7,
    AnyUnorderedNode = 8,
    FirstOrderedNode = 9,
}

impl ResultType {
    pub const ALL: [ResultType; 10] = [
        ResultType::Any,
        ResultType::Number,
        ResultType::String,
        ResultType::Boolean,
        ResultType::UnorderedNodeIterator,
        ResultType::OrderedNodeIterator,
        ResultType::UnorderedNodeSnapshot,
        ResultType::OrderedNodeSnapshot,
        ResultType::AnyUnorderedNode,
        ResultType::FirstOrderedNode,
    ];

    pub fn code(self) -> u16 {
        self as u16
    }

    /// The type a value of the given kind takes when `Any` is requested.
    pub fn natural(kind: ValueKind) -> Self {
        match kind {
            ValueKind::NodeSet => ResultType::UnorderedNodeIterator,
            ValueKind::Number => ResultType::Number,
            ValueKind::String => ResultType::String,
            ValueKind::Boolean => ResultType::Boolean,
        }
    }

    pub fn is_node_set(self) -> bool {
        self.code() >= 4
    }

    pub fn is_iterator(self) -> bool {
        matches!(
            self,
            ResultType::UnorderedNodeIterator | ResultType::OrderedNodeIterator
        )
    }

    pub fn is_snapshot(self) -> bool {
        matches!(
            self,
            ResultType::UnorderedNodeSnapshot | ResultType::OrderedNodeSnapshot
        )
    }

    pub fn is_single_node(self) -> bool {
        matches!(
            self,
            ResultType::AnyUnorderedNode | ResultType::FirstOrderedNode
        )
    }

    /// The constant name used by the DOM interface.
    pub fn name(self) -> &'static str {
        match self {
            ResultType::Any => "ANY_TYPE",
            ResultType::Number => "NUMBER_TYPE",
            ResultType::String => "STRING_TYPE",
            ResultType::Boolean => "BOOLEAN_TYPE",
            ResultType::UnorderedNodeIterator => "UNORDERED_NODE_ITERATOR_TYPE",
            ResultType::OrderedNodeIterator => "ORDERED_NODE_ITERATOR_TYPE",
            ResultType::UnorderedNodeSnapshot => "UNORDERED_NODE_SNAPSHOT_TYPE",
            ResultType::OrderedNodeSnapshot => "ORDERED_NODE_SNAPSHOT_TYPE",
            ResultType::AnyUnorderedNode => "ANY_UNORDERED_NODE_TYPE",
            ResultType::FirstOrderedNode => "FIRST_ORDERED_NODE_TYPE",
        }
    }
}

impl TryFrom<u16> for ResultType {
    type Error = Error;

    fn try_from(code: u16) -> Result<Self, Error> {
        ResultType::ALL
            .get(usize::from(code))
            .copied()
            .ok_or(Error::UnknownResultType(code))
    }
}

impl From<ResultType> for u16 {
    fn from(result_type: ResultType) -> u16 {
        result_type.code()
    }
}

impl fmt::Display for ResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
