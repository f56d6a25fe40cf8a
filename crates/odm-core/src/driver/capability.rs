#[derive(Debug)]
pub struct Capability {
    /// Cursors over this backend may be indexed from the end.
    pub negative_index: bool,
}

impl Capability {
    /// Backends supporting only the required contract.
    pub const DEFAULT: Self = Self {
        negative_index: false,
    };

    /// In-memory backend capabilities
    pub const MEMORY: Self = Self {
        negative_index: true,
    };
}
