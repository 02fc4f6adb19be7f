//! Type-tagged clipboard payloads for homogeneous node lists.
//!
//! # Responsibility
//! - Encode a homogeneous sibling selection into a JSON node list keyed by
//!   the kind's format string, plus a plain-text summary.
//! - Decode a node list and validate kinds at every depth before anything
//!   touches the document.
//!
//! # Invariants
//! - Payload trees carry no node identity; decoding never reuses ids.
//! - A payload never mixes kinds.

use crate::clipboard::{ClipboardContents, TEXT_FORMAT};
use crate::model::bible::Bible;
use crate::model::node::{NodeId, NodeKind, NodeTree};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from clipboard encode/decode.
#[derive(Debug)]
pub enum ClipboardError {
    /// Nothing was selected for copy.
    EmptySelection,
    /// Selection spans more than one kind.
    MixedKinds,
    /// Kind has no clipboard format (the document root).
    UnsupportedKind(NodeKind),
    /// Selected id is not part of the document.
    NodeNotFound(NodeId),
    /// Format key is not a known node-list format.
    UnknownFormat(String),
    /// JSON serialization failed.
    Encode(serde_json::Error),
    /// JSON payload is malformed.
    Decode(serde_json::Error),
    /// Payload tree holds a node of the wrong kind at some depth.
    UnexpectedKind {
        expected: NodeKind,
        actual: NodeKind,
    },
}

impl Display for ClipboardError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptySelection => write!(f, "nothing selected to copy"),
            Self::MixedKinds => write!(f, "selection mixes node kinds"),
            Self::UnsupportedKind(kind) => {
                write!(f, "`{}` nodes cannot be copied", kind.as_str())
            }
            Self::NodeNotFound(id) => write!(f, "node not found: {id}"),
            Self::UnknownFormat(format) => write!(f, "unknown clipboard format `{format}`"),
            Self::Encode(err) => write!(f, "failed to encode clipboard payload: {err}"),
            Self::Decode(err) => write!(f, "failed to decode clipboard payload: {err}"),
            Self::UnexpectedKind { expected, actual } => write!(
                f,
                "clipboard payload expected `{}` node, found `{}`",
                expected.as_str(),
                actual.as_str()
            ),
        }
    }
}

impl Error for ClipboardError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Encode(err) | Self::Decode(err) => Some(err),
            _ => None,
        }
    }
}

/// Result type used by the clipboard codec.
pub type ClipboardResult<T> = Result<T, ClipboardError>;

/// Encoded copy of one homogeneous selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    kind: NodeKind,
    format: &'static str,
    data: String,
    text: String,
}

impl Payload {
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Node-list format key the JSON data is stored under.
    pub fn format(&self) -> &'static str {
        self.format
    }

    /// JSON array of node trees.
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Newline-joined plain-text summary.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Clipboard entries: the node list plus `text/plain`.
    pub fn into_contents(self) -> ClipboardContents {
        let mut contents = ClipboardContents::new();
        contents.insert(self.format.to_string(), self.data);
        contents.insert(TEXT_FORMAT.to_string(), self.text);
        contents
    }
}

/// Encodes `ids` (selection order) as one clipboard payload.
///
/// # Errors
/// - `EmptySelection`, `MixedKinds`, `UnsupportedKind` for selections that
///   cannot be copied.
/// - `NodeNotFound` when an id is not in `bible`.
/// - `Encode` when JSON serialization fails.
pub fn encode(bible: &Bible, ids: &[NodeId]) -> ClipboardResult<Payload> {
    let first = *ids.first().ok_or(ClipboardError::EmptySelection)?;
    let kind = bible
        .kind_of(first)
        .ok_or(ClipboardError::NodeNotFound(first))?;
    let format = kind
        .clipboard_format()
        .ok_or(ClipboardError::UnsupportedKind(kind))?;

    let mut trees = Vec::with_capacity(ids.len());
    for id in ids {
        let tree = bible.to_tree(*id).ok_or(ClipboardError::NodeNotFound(*id))?;
        if tree.kind() != kind {
            return Err(ClipboardError::MixedKinds);
        }
        trees.push(tree);
    }

    let text = trees
        .iter()
        .map(|tree| tree.data.summary())
        .collect::<Vec<_>>()
        .join("\n");
    let data = serde_json::to_string(&trees).map_err(ClipboardError::Encode)?;
    Ok(Payload {
        kind,
        format,
        data,
        text,
    })
}

/// Decodes a node-list payload stored under `format`.
///
/// Every tree is validated against the format's kind at every depth, so a
/// successful decode can be inserted without partial failure.
pub fn decode(format: &str, data: &str) -> ClipboardResult<Vec<NodeTree>> {
    let kind = NodeKind::from_clipboard_format(format)
        .ok_or_else(|| ClipboardError::UnknownFormat(format.to_string()))?;
    let trees: Vec<NodeTree> = serde_json::from_str(data).map_err(ClipboardError::Decode)?;
    for tree in &trees {
        tree.check_kinds(kind)
            .map_err(|(expected, actual)| ClipboardError::UnexpectedKind { expected, actual })?;
    }
    Ok(trees)
}
