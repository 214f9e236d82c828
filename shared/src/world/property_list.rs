/// One descriptive line of a property summary: a localized string number plus
/// its tab-separated arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyLine {
    pub number: u32,
    pub args: String,
}

/// The derived descriptive summary of an entity. Clients cache summaries by
/// hash, so a new summary is only worth sending when the hash moved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyList {
    lines: Vec<PropertyLine>,
    hash: u32,
}

const FNV_OFFSET: u32 = 0x811C_9DC5;
const FNV_PRIME: u32 = 0x0100_0193;

impl PropertyList {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            hash: FNV_OFFSET,
        }
    }

    pub fn add(&mut self, number: u32, args: impl Into<String>) -> &mut Self {
        let args = args.into();
        self.mix(&number.to_be_bytes());
        self.mix(args.as_bytes());
        // separator so ("ab","c") and ("a","bc") hash apart
        self.mix(&[0]);
        self.lines.push(PropertyLine { number, args });
        self
    }

    fn mix(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.hash ^= u32::from(*byte);
            self.hash = self.hash.wrapping_mul(FNV_PRIME);
        }
    }

    pub fn hash(&self) -> u32 {
        self.hash
    }

    pub fn lines(&self) -> &[PropertyLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl Default for PropertyList {
    fn default() -> Self {
        Self::new()
    }
}
