/// State of a heap slot in the in-memory queue. Lazy deletion: a replaced
/// or removed item is marked `Removed` and skipped when popped rather than
/// spliced out of the binary heap in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Added,
    Removed,
}
