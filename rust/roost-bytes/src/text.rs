//! UTF-8 validated views over shared byte storage.

use std::borrow::{Borrow, Cow};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::str::Utf8Error;

use thiserror::Error;

use crate::ByteView;

/// An immutable, cheaply cloneable string backed by shared byte storage.
///
/// `TextView` is a [`ByteView`] carrying the invariant that its bytes are
/// valid UTF-8. Cache entries known to hold text can be wrapped once and then
/// read as `&str` by any number of concurrent lookups, with the same sharing
/// and immutability guarantees as the underlying view.
///
/// # Examples
///
/// ```
/// use roost_bytes::ByteView;
/// use roost_bytes::text::TextView;
///
/// let view = ByteView::copy_from_slice(b"hello");
/// let text = TextView::from_utf8(view).unwrap();
/// assert_eq!(text.as_str(), "hello");
/// ```
#[derive(Clone)]
pub struct TextView {
    // Invariant: `view` contains valid UTF-8.
    view: ByteView,
}

impl TextView {
    /// Creates a new empty `TextView`.
    pub fn new() -> TextView {
        TextView {
            view: ByteView::new(),
        }
    }

    /// Validates `view` as UTF-8 and wraps it without copying.
    ///
    /// On failure the rejected view is handed back inside the error.
    pub fn from_utf8(view: ByteView) -> Result<TextView, FromUtf8Error> {
        match std::str::from_utf8(view.as_slice()) {
            Ok(_) => Ok(TextView { view }),
            Err(source) => Err(FromUtf8Error { view, source }),
        }
    }

    /// Decodes `view` as UTF-8, replacing invalid sequences with U+FFFD.
    ///
    /// Valid input is wrapped without copying; invalid input is re-encoded
    /// into fresh storage.
    pub fn from_utf8_lossy(view: ByteView) -> TextView {
        match String::from_utf8_lossy(view.as_slice()) {
            Cow::Borrowed(_) => TextView { view },
            Cow::Owned(text) => TextView {
                view: ByteView::from_vec(text.into_bytes()),
            },
        }
    }

    /// Returns the view's contents as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        // The `view` invariant makes this infallible.
        std::str::from_utf8(self.view.as_slice()).expect("TextView holds valid UTF-8")
    }

    /// Returns the length of the text in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.view.len()
    }

    /// Returns `true` if the text is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.view.is_empty()
    }

    /// Returns a reference to the underlying byte view.
    pub fn as_view(&self) -> &ByteView {
        &self.view
    }

    /// Consumes the `TextView` and returns the underlying byte view.
    pub fn into_view(self) -> ByteView {
        self.view
    }
}

impl Default for TextView {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for TextView {
    type Target = str;

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl AsRef<str> for TextView {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl AsRef<[u8]> for TextView {
    fn as_ref(&self) -> &[u8] {
        self.view.as_slice()
    }
}

impl Borrow<str> for TextView {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl From<String> for TextView {
    fn from(s: String) -> Self {
        // A String is valid UTF-8 by construction.
        TextView {
            view: ByteView::from_vec(s.into_bytes()),
        }
    }
}

impl From<&str> for TextView {
    fn from(s: &str) -> Self {
        TextView {
            view: ByteView::copy_from_slice(s.as_bytes()),
        }
    }
}

impl TryFrom<ByteView> for TextView {
    type Error = FromUtf8Error;

    fn try_from(view: ByteView) -> Result<TextView, FromUtf8Error> {
        TextView::from_utf8(view)
    }
}

impl From<TextView> for ByteView {
    fn from(text: TextView) -> ByteView {
        text.into_view()
    }
}

impl fmt::Debug for TextView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TextView").field(&self.as_str()).finish()
    }
}

impl fmt::Display for TextView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialEq for TextView {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for TextView {}

impl PartialEq<str> for TextView {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for TextView {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl PartialEq<String> for TextView {
    fn eq(&self, other: &String) -> bool {
        self.as_str() == other.as_str()
    }
}

impl PartialOrd for TextView {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TextView {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl Hash for TextView {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

/// Error returned by [`TextView::from_utf8`] when the bytes are not valid
/// UTF-8.
///
/// The rejected view is preserved and can be recovered with
/// [`into_view`](FromUtf8Error::into_view).
#[derive(Debug, Clone, Error)]
#[error("invalid utf-8 in byte view: {source}")]
pub struct FromUtf8Error {
    view: ByteView,
    source: Utf8Error,
}

impl FromUtf8Error {
    /// Returns a reference to the rejected bytes.
    pub fn as_view(&self) -> &ByteView {
        &self.view
    }

    /// Consumes the error and returns the rejected view.
    pub fn into_view(self) -> ByteView {
        self.view
    }

    /// Returns the underlying UTF-8 decoding error.
    pub fn utf8_error(&self) -> Utf8Error {
        self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_view_from_utf8() {
        let view = ByteView::copy_from_slice(b"hello");
        let ptr = view.as_slice().as_ptr();
        let text = TextView::from_utf8(view).unwrap();
        assert_eq!(text.as_str(), "hello");
        assert_eq!(text.len(), 5);
        // Wrapping shares the storage; it does not copy it.
        assert_eq!(text.as_view().as_slice().as_ptr(), ptr);
    }

    #[test]
    fn test_text_view_from_utf8_invalid() {
        let view = ByteView::copy_from_slice(&[b'a', 0xFF, b'b']);
        let err = TextView::from_utf8(view).unwrap_err();
        assert_eq!(err.utf8_error().valid_up_to(), 1);
        assert_eq!(err.as_view().len(), 3);

        let view = err.into_view();
        assert_eq!(view.as_slice(), &[b'a', 0xFF, b'b']);
    }

    #[test]
    fn test_text_view_from_utf8_lossy() {
        let view = ByteView::copy_from_slice(b"hello");
        let ptr = view.as_slice().as_ptr();
        let text = TextView::from_utf8_lossy(view);
        assert_eq!(text.as_str(), "hello");
        assert_eq!(text.as_view().as_slice().as_ptr(), ptr);

        let invalid = ByteView::copy_from_slice(&[b'a', 0xFF, b'b']);
        let text = TextView::from_utf8_lossy(invalid);
        assert_eq!(text.as_str(), "a\u{FFFD}b");

        // Agrees with std's lossy decoding, including a multibyte sequence
        // truncated at the end of the payload.
        let mut payload = b"ok: ".to_vec();
        payload.extend_from_slice(&[0xE2, 0x82]);
        let text = TextView::from_utf8_lossy(ByteView::copy_from_slice(&payload));
        assert_eq!(text.as_str(), String::from_utf8_lossy(&payload));
    }

    #[test]
    fn test_text_view_error_display() {
        let view = ByteView::copy_from_slice(&[0xC3, 0x28]);
        let err = TextView::from_utf8(view).unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("invalid utf-8 in byte view"), "{message}");
    }

    #[test]
    fn test_text_view_from_string_is_zero_copy() {
        let s = String::from("hello world");
        let ptr = s.as_ptr();
        let text = TextView::from(s);
        assert_eq!(text.as_str(), "hello world");
        assert_eq!(text.as_view().as_slice().as_ptr(), ptr);
    }

    #[test]
    fn test_text_view_from_str_copies() {
        let source = String::from("hello");
        let text = TextView::from(source.as_str());
        drop(source);
        assert_eq!(text.as_str(), "hello");
    }

    #[test]
    fn test_text_view_try_from() {
        let text = TextView::try_from(ByteView::copy_from_slice(b"ok")).unwrap();
        assert_eq!(text, "ok");

        TextView::try_from(ByteView::copy_from_slice(&[0xFF])).unwrap_err();
    }

    #[test]
    fn test_text_view_into_view_roundtrip() {
        let text = TextView::from("roost");
        let view = ByteView::from(text);
        assert_eq!(view, *"roost");

        let text = TextView::from_utf8(view).unwrap();
        assert_eq!(text.as_str(), "roost");
    }

    #[test]
    fn test_text_view_deref() {
        let text = TextView::from("hello world");
        assert!(text.starts_with("hello"));
        assert_eq!(&text[6..], "world");
        assert_eq!(text.split(' ').count(), 2);
    }

    #[test]
    fn test_text_view_display_and_debug() {
        let text = TextView::from("hello");
        assert_eq!(format!("{text}"), "hello");
        assert_eq!(format!("{text:?}"), "TextView(\"hello\")");
    }

    #[test]
    fn test_text_view_equality_and_ordering() {
        let a = TextView::from("abc");
        let b = TextView::from(String::from("abc"));
        assert_eq!(a, b);
        assert_eq!(a, *"abc");
        assert_eq!(a, "abc");
        assert_eq!(a, String::from("abc"));
        assert_ne!(a, "abd");
        assert!(a < TextView::from("abd"));
        assert_eq!(a.cmp(&b), Ordering::Equal);
    }

    #[test]
    fn test_text_view_hash_and_borrow_lookup() {
        use std::collections::HashMap;

        let mut map = HashMap::new();
        map.insert(TextView::from("key"), 17);
        assert_eq!(map.get("key"), Some(&17));
        assert_eq!(map.get("missing"), None);
    }

    #[test]
    fn test_text_view_empty() {
        let text = TextView::new();
        assert_eq!(text.len(), 0);
        assert!(text.is_empty());
        assert_eq!(text.as_str(), "");
        assert_eq!(TextView::default(), text);
    }

    #[test]
    fn test_text_view_clone_is_shallow() {
        let text = TextView::from("hello");
        let clone = text.clone();
        assert_eq!(text, clone);
        assert_eq!(
            text.as_view().as_slice().as_ptr(),
            clone.as_view().as_slice().as_ptr()
        );
    }

    #[test]
    fn test_text_view_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TextView>();
        assert_send_sync::<FromUtf8Error>();
    }
}
