//! Names of the files a node exposes to the file manager

/// File kind, identified by the file name extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FileKind {
    /// Signal definition text
    Definition,
    /// Input (require port) data
    InPortData,
    /// Output (provide port) data
    OutPortData,
}

impl FileKind {
    pub const fn extension(self) -> &'static str {
        match self {
            FileKind::Definition => ".apx",
            FileKind::InPortData => ".in",
            FileKind::OutPortData => ".out",
        }
    }
}

/// Displays as `<node name><extension>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileName<'a> {
    pub node: &'a str,
    pub kind: FileKind,
}

impl core::fmt::Display for FileName<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}{}", self.node, self.kind.extension())
    }
}
