/// State carried through the writing of one statement.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Context {
    /// Placeholders written so far.
    pub counter: u32,
}
