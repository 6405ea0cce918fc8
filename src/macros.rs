/// Build a [`Stream`](crate::stream::Stream) from a list of values.
///
/// Values are emitted in order, then the stream completes. With no
/// arguments the stream completes immediately.
///
/// # Example
///
/// ```rust
/// use rewind::stream_of;
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let seen = Rc::new(RefCell::new(Vec::new()));
/// let sink = Rc::clone(&seen);
///
/// stream_of![1, 2, 3].subscribe(move |x| sink.borrow_mut().push(x));
///
/// assert_eq!(*seen.borrow(), vec![1, 2, 3]);
/// ```
#[macro_export]
macro_rules! stream_of {
    () => {
        $crate::stream::Stream::empty()
    };
    ($($value:expr),+ $(,)?) => {
        $crate::stream::Stream::of([$($value),+])
    };
}
