/// Classification for fallback policy.
///
/// Used by callers that walk an ordered list of providers to decide whether the
/// next provider is worth asking.
///
/// | Class | Try Next Provider? |
/// |-------|-------------------|
/// | `Never` | No |
/// | `NextProvider` | Yes |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Nothing is left to ask, e.g. a nested chain already exhausted its
    /// own providers.
    Never,

    /// This provider could not answer, another one might.
    NextProvider,
}
