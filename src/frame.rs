//! The nesting stack shared by the reader and writer: one frame per open
//! node or array awaiting its matching end tag.

use crate::types::TypeRef;


/// Reference nodes carry a non-negative reference id; struct nodes always
/// carry this sentinel.
pub const STRUCT_NODE_ID: i32 = -1;

#[derive(Debug, Clone)]
pub(crate) enum Frame {
    Node {
        name: Option<String>,
        /// [`STRUCT_NODE_ID`] for struct nodes, the reference id otherwise.
        id: i32,
        ty: Option<TypeRef>,
    },
    Array {
        length: i64,
    },
}

impl Frame {
    pub(crate) fn is_array(&self) -> bool {
        matches!(self, Frame::Array { .. })
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            Frame::Node { name: Some(name), .. } => format!("node {:?}", name),
            Frame::Node { name: None, .. } => "unnamed node".to_owned(),
            Frame::Array { length } => format!("array of length {}", length),
        }
    }
}
