#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed record: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("invalid storage key `{0}`")]
    InvalidKey(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("duplicate node id `{0}`")]
    DuplicateNode(String),
    #[error("duplicate edge id `{0}`")]
    DuplicateEdge(String),
    #[error("edge `{edge}` references missing node `{node}`")]
    DanglingEdge { edge: String, node: String },
    #[error("graph has no root node")]
    MissingRoot,
    #[error("graph has {0} root nodes")]
    MultipleRoots(usize),
}
