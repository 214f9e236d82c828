/// Wire dialect spoken by a connected client. Message content may differ
/// between the two, nothing else does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ProtocolVariant {
    #[default]
    Legacy,
    Extended,
}

impl ProtocolVariant {
    pub const COUNT: usize = 2;

    pub const ALL: [ProtocolVariant; 2] = [ProtocolVariant::Legacy, ProtocolVariant::Extended];

    pub fn slot(self) -> usize {
        match self {
            ProtocolVariant::Legacy => 0,
            ProtocolVariant::Extended => 1,
        }
    }

    pub fn is_extended(self) -> bool {
        self == ProtocolVariant::Extended
    }
}
