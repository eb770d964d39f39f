/// Something that can produce a candidate response.
///
/// A brain generates from its own store; the registry's global generator
/// pools every loaded brain. Callers pick one per channel.
pub trait TokenGenerator: Send + Sync {
    /// Produce text of at most `max_tokens` sampled tokens after the seed
    /// pair. An empty string means there was nothing to say.
    fn generate(&self, max_tokens: usize) -> String;

    /// Whether this generator draws on more than one channel.
    fn is_global(&self) -> bool {
        false
    }
}

impl<F> TokenGenerator for F
where
    F: Fn(usize) -> String + Send + Sync,
{
    fn generate(&self, max_tokens: usize) -> String {
        self(max_tokens)
    }
}
