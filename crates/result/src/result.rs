//! Materializes an XPath value into one of the ten DOM result shapes.

use crate::error::Error;
use crate::result_type::ResultType;
use domxpath_xpath1::engine::document_order;
use domxpath_xpath1::{DataSourceNode, MutationCounter, XPathValue};

/// The outcome of evaluating an expression for a requested result type.
///
/// Node-set results hold owned node keys rather than borrowed handles, so a
/// result can outlive the borrow of the tree it was produced from. Look the
/// keys up in the tree again to navigate from them.
#[derive(Debug, Clone)]
pub struct XPathResult<K> {
    result_type: ResultType,
    payload: Payload<K>,
}

#[derive(Debug, Clone)]
enum Payload<K> {
    Number(f64),
    String(String),
    Boolean(bool),
    Single(Option<K>),
    Snapshot(Vec<K>),
    Iterator(NodeIterator<K>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IteratorState {
    Active,
    Exhausted,
    Stale,
}

/// A cursor over a node-set that is invalidated by structural changes to the
/// tree it was taken from.
#[derive(Debug, Clone)]
pub struct NodeIterator<K> {
    nodes: Vec<K>,
    next: usize,
    counter: MutationCounter,
    generation: u64,
    state: IteratorState,
}

impl<K: Copy> NodeIterator<K> {
    fn new(nodes: Vec<K>, counter: MutationCounter) -> Self {
        let generation = counter.current();
        Self {
            nodes,
            next: 0,
            counter,
            generation,
            state: IteratorState::Active,
        }
    }

    /// Whether the tree changed since the iterator was created. Once exhausted
    /// the iterator no longer watches the tree.
    pub fn is_invalid(&self) -> bool {
        match self.state {
            IteratorState::Active => self.counter.current() != self.generation,
            IteratorState::Exhausted => false,
            IteratorState::Stale => true,
        }
    }

    pub fn next_node(&mut self) -> Result<Option<K>, Error> {
        match self.state {
            IteratorState::Exhausted => return Ok(None),
            IteratorState::Stale => return Err(Error::StaleIterator),
            IteratorState::Active => {}
        }
        if self.counter.current() != self.generation {
            log::debug!("Node iterator invalidated by a structural change");
            self.state = IteratorState::Stale;
            return Err(Error::StaleIterator);
        }
        match self.nodes.get(self.next).copied() {
            Some(node) => {
                self.next += 1;
                Ok(Some(node))
            }
            None => {
                self.state = IteratorState::Exhausted;
                Ok(None)
            }
        }
    }
}

impl<K: Copy> XPathResult<K> {
    pub fn result_type(&self) -> ResultType {
        self.result_type
    }

    fn invalid_access(&self, accessor: &'static str) -> Error {
        Error::InvalidAccess {
            accessor,
            result_type: self.result_type,
        }
    }

    pub fn number_value(&self) -> Result<f64, Error> {
        match &self.payload {
            Payload::Number(n) => Ok(*n),
            _ => Err(self.invalid_access("numberValue")),
        }
    }

    pub fn string_value(&self) -> Result<&str, Error> {
        match &self.payload {
            Payload::String(s) => Ok(s),
            _ => Err(self.invalid_access("stringValue")),
        }
    }

    pub fn boolean_value(&self) -> Result<bool, Error> {
        match &self.payload {
            Payload::Boolean(b) => Ok(*b),
            _ => Err(self.invalid_access("booleanValue")),
        }
    }

    /// The selected node of a single-node result, `None` when nothing matched.
    pub fn single_node_value(&self) -> Result<Option<K>, Error> {
        match &self.payload {
            Payload::Single(node) => Ok(*node),
            _ => Err(self.invalid_access("singleNodeValue")),
        }
    }

    pub fn snapshot_length(&self) -> Result<usize, Error> {
        match &self.payload {
            Payload::Snapshot(nodes) => Ok(nodes.len()),
            _ => Err(self.invalid_access("snapshotLength")),
        }
    }

    pub fn snapshot_item(&self, index: usize) -> Result<K, Error> {
        match &self.payload {
            Payload::Snapshot(nodes) => nodes.get(index).copied().ok_or(Error::Index {
                index,
                length: nodes.len(),
            }),
            _ => Err(self.invalid_access("snapshotItem")),
        }
    }

    /// All snapshot members in order.
    pub fn snapshot(&self) -> Result<&[K], Error> {
        match &self.payload {
            Payload::Snapshot(nodes) => Ok(nodes),
            _ => Err(self.invalid_access("snapshotItem")),
        }
    }

    /// Advances an iterator result. Returns `Ok(None)` once every node has been
    /// returned and fails with [`Error::StaleIterator`] if the tree was
    /// structurally changed before that.
    pub fn iterate_next(&mut self) -> Result<Option<K>, Error> {
        let result_type = self.result_type;
        match &mut self.payload {
            Payload::Iterator(iterator) => iterator.next_node(),
            _ => Err(Error::InvalidAccess {
                accessor: "iterateNext",
                result_type,
            }),
        }
    }

    pub fn invalid_iterator_state(&self) -> bool {
        match &self.payload {
            Payload::Iterator(iterator) => iterator.is_invalid(),
            _ => false,
        }
    }
}

/// Converts an evaluated value into the shape `requested` asks for.
///
/// Scalar types convert any value with the usual XPath rules. Node-set types
/// require a node-set and fail with [`Error::Type`] otherwise. Node-sets are
/// always delivered in document order, for the unordered codes as well.
/// `counter` is the mutation counter of the tree iterators are bound to.
pub fn materialize<'a, N: DataSourceNode<'a>>(
    value: XPathValue<N>,
    requested: ResultType,
    counter: MutationCounter,
) -> Result<XPathResult<N::Key>, Error> {
    let natural = value.kind();
    let (result_type, payload) = match (requested, value) {
        (ResultType::Number, value) | (ResultType::Any, value @ XPathValue::Number(_)) => {
            (ResultType::Number, Payload::Number(value.to_number()))
        }
        (ResultType::String, value) | (ResultType::Any, value @ XPathValue::String(_)) => {
            (ResultType::String, Payload::String(value.to_string()))
        }
        (ResultType::Boolean, value) | (ResultType::Any, value @ XPathValue::Boolean(_)) => {
            (ResultType::Boolean, Payload::Boolean(value.to_bool()))
        }
        (requested, XPathValue::NodeSet(nodes)) => {
            let result_type = match requested {
                ResultType::Any => ResultType::natural(natural),
                other => other,
            };
            let keys: Vec<N::Key> = document_order(nodes).iter().map(|n| n.key()).collect();
            (result_type, node_payload(result_type, keys, counter))
        }
        (requested, _) => {
            return Err(Error::Type {
                natural,
                requested,
            });
        }
    };
    log::debug!("Materialized a {} value as {}", natural, result_type);
    Ok(XPathResult {
        result_type,
        payload,
    })
}

/// Payload for one of the node-set result types.
fn node_payload<K: Copy>(result_type: ResultType, keys: Vec<K>, counter: MutationCounter) -> Payload<K> {
    if result_type.is_iterator() {
        Payload::Iterator(NodeIterator::new(keys, counter))
    } else if result_type.is_snapshot() {
        Payload::Snapshot(keys)
    } else {
        Payload::Single(keys.first().copied())
    }
}
