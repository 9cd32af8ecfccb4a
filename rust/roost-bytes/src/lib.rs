//! Byte buffers for values held by the Roost cache, mutable and shared
//! immutable.
//!
//! A value is assembled once by the cache-fill path in a [`ByteViewMut`],
//! frozen into an immutable [`ByteView`], and from then on served to
//! arbitrarily many concurrent lookups. Every extraction path either copies
//! the payload out or hands back a shared read-only borrow, so cached bytes
//! cannot be corrupted by a careless caller.

use std::borrow::{Borrow, Cow};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Deref, DerefMut, RangeBounds};
use std::sync::Arc;

pub mod text;

/// A mutable buffer of bytes, conceptually similar to a `Vec<u8>`.
///
/// This struct is designed for efficiently building an immutable [`ByteView`]
/// instance: the cache-fill path accumulates a value here, then freezes it
/// with [`into_view`](ByteViewMut::into_view).
#[derive(Debug)]
pub struct ByteViewMut(Vec<u8>);

impl ByteViewMut {
    /// Creates a new empty `ByteViewMut`.
    pub fn new() -> ByteViewMut {
        Self::with_capacity(0)
    }

    /// Creates a new `ByteViewMut` with the specified capacity.
    ///
    /// The buffer will be able to hold at least `capacity` bytes without reallocating.
    pub fn with_capacity(capacity: usize) -> ByteViewMut {
        ByteViewMut(Vec::with_capacity(capacity))
    }

    /// Creates a new `ByteViewMut` with the specified length, filled with zero bytes.
    pub fn zeroed(len: usize) -> ByteViewMut {
        ByteViewMut(vec![0; len])
    }

    /// Creates a new `ByteViewMut` containing a copy of the provided slice.
    pub fn copy_from_slice(s: &[u8]) -> ByteViewMut {
        ByteViewMut(s.to_vec())
    }

    /// Returns the length of the buffer.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the capacity of the buffer.
    ///
    /// The capacity is the amount of space allocated for the buffer in terms of bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.0.capacity()
    }

    /// Truncates the buffer to the specified length.
    ///
    /// If `len` is greater than the current length, this has no effect.
    #[inline]
    pub fn truncate(&mut self, len: usize) {
        self.0.truncate(len);
    }

    /// Clears the buffer, removing all its contents.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Resizes the buffer to the specified length.
    ///
    /// If `new_len` is greater than the current length, the buffer is extended with the
    /// given `value`. If `new_len` is less than the current length, the buffer is simply
    /// truncated.
    #[inline]
    pub fn resize(&mut self, new_len: usize, value: u8) {
        self.0.resize(new_len, value);
    }

    /// Reserves capacity for at least `additional` more bytes.
    #[inline]
    pub fn reserve(&mut self, additional: usize) {
        self.0.reserve(additional);
    }

    /// Appends all bytes from a slice to the buffer.
    #[inline]
    pub fn extend_from_slice(&mut self, extend: &[u8]) {
        self.0.extend_from_slice(extend);
    }

    /// Appends a value of type `T` to the buffer by copying its bytes.
    #[inline]
    pub fn push_typed<T>(&mut self, value: T)
    where
        T: bytemuck::NoUninit,
    {
        self.0.extend_from_slice(bytemuck::bytes_of(&value));
    }

    /// Appends a slice of values of type `T` to the buffer by copying their bytes.
    #[inline]
    pub fn extend_from_typed_slice<T>(&mut self, values: &[T])
    where
        T: bytemuck::NoUninit,
    {
        self.0.extend_from_slice(bytemuck::cast_slice(values));
    }

    /// Returns a slice of the buffer's contents.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        self
    }

    /// Returns a mutable slice of the buffer's contents.
    #[inline]
    pub fn as_slice_mut(&mut self) -> &mut [u8] {
        self
    }

    /// Shrinks the capacity of the buffer as much as possible.
    pub fn shrink_to_fit(&mut self) {
        self.0.shrink_to_fit();
    }

    /// Consumes the `ByteViewMut` and converts it into an immutable [`ByteView`].
    ///
    /// The accumulated bytes are moved into shared storage; nothing is copied.
    pub fn into_view(self) -> ByteView {
        ByteView::from_vec(self.0)
    }

    /// Consumes the `ByteViewMut` and returns the underlying vector.
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl Default for ByteViewMut {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl Deref for ByteViewMut {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.0.as_slice()
    }
}

impl DerefMut for ByteViewMut {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.0.as_mut_slice()
    }
}

impl From<Vec<u8>> for ByteViewMut {
    fn from(vec: Vec<u8>) -> Self {
        ByteViewMut(vec)
    }
}

impl From<String> for ByteViewMut {
    fn from(s: String) -> Self {
        Self::from(s.into_bytes())
    }
}

impl From<&str> for ByteViewMut {
    fn from(s: &str) -> Self {
        Self::from(s.as_bytes())
    }
}

impl From<&[u8]> for ByteViewMut {
    fn from(s: &[u8]) -> Self {
        ByteViewMut::copy_from_slice(s)
    }
}

impl std::io::Write for ByteViewMut {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// A contiguous, immutable sequence of bytes that can be shared across
/// clones, sub-views and thread boundaries.
///
/// `ByteView` is what the cache stores and what lookups receive. Cloning and
/// slicing are O(1) and share the backing allocation; no method gives out
/// mutable access to that allocation, so any number of readers may use views
/// concurrently without synchronization.
///
/// # Examples
///
/// ```
/// use roost_bytes::{ByteView, ByteViewMut};
///
/// let mut value = ByteViewMut::with_capacity(16);
/// value.extend_from_slice(b"hello world");
/// let view = value.into_view();
///
/// let copy = view.to_vec();
/// assert_eq!(copy, b"hello world");
/// assert_eq!(&view.slice(..5)[..], b"hello");
/// ```
#[derive(Clone)]
pub struct ByteView {
    data: Arc<Vec<u8>>,
    offset: usize,
    len: usize,
}

impl ByteView {
    /// Creates a new empty `ByteView`.
    pub fn new() -> ByteView {
        ByteView::from_vec(Vec::new())
    }

    /// Creates a new `ByteView` that takes ownership of the provided vector.
    ///
    /// No bytes are copied. The caller gives up its handle on the storage, so
    /// the view's contents cannot be changed from the outside afterwards.
    pub fn from_vec(vec: Vec<u8>) -> ByteView {
        let len = vec.len();
        ByteView {
            data: Arc::new(vec),
            offset: 0,
            len,
        }
    }

    /// Creates a new `ByteView` by copying data from a slice.
    ///
    /// The copy severs any connection to the source buffer: mutating `data`
    /// after this call does not show through the view.
    pub fn copy_from_slice(data: &[u8]) -> ByteView {
        ByteView::from_vec(data.to_vec())
    }

    /// Returns the length of the view.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the view is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns a reference to the view's contents as a byte slice.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data[self.offset..self.offset + self.len]
    }

    /// Returns the byte at the given index, or `None` if out of bounds.
    #[inline]
    pub fn get(&self, index: usize) -> Option<u8> {
        if index < self.len {
            Some(self.data[self.offset + index])
        } else {
            None
        }
    }

    /// Returns the byte at the given index.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[inline]
    pub fn at(&self, index: usize) -> u8 {
        self.as_slice()[index]
    }

    /// Copies the view's contents into a freshly allocated `Vec<u8>`.
    ///
    /// The returned vector shares no storage with the view: either side can be
    /// mutated or dropped with no effect on the other. Costs O(n) time and
    /// space in the length of the view.
    pub fn to_vec(&self) -> Vec<u8> {
        self.as_slice().to_vec()
    }

    /// Decodes the view's bytes as UTF-8 text.
    ///
    /// No validation is performed: invalid sequences decode to U+FFFD
    /// replacement characters and never fail. Callers that need validated
    /// text should go through [`text::TextView`] instead.
    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.as_slice())
    }

    /// Creates a new `ByteView` by slicing the current one within the given range.
    ///
    /// This operation is zero-copy; the returned view shares the backing
    /// allocation.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds.
    pub fn slice(&self, range: impl RangeBounds<usize>) -> ByteView {
        use std::ops::Bound;

        let start = match range.start_bound() {
            Bound::Included(&n) => n,
            Bound::Excluded(&n) => n.checked_add(1).expect("out of range"),
            Bound::Unbounded => 0,
        };

        let end = match range.end_bound() {
            Bound::Included(&n) => n.checked_add(1).expect("out of range"),
            Bound::Excluded(&n) => n,
            Bound::Unbounded => self.len,
        };

        assert!(
            start <= end,
            "range start must not be greater than end: {:?} <= {:?}",
            start,
            end,
        );
        assert!(
            end <= self.len,
            "range end out of bounds: {:?} <= {:?}",
            end,
            self.len,
        );

        ByteView {
            data: self.data.clone(),
            offset: self.offset + start,
            len: end - start,
        }
    }

    /// Copies as many bytes as fit into `dest`, starting from the beginning of
    /// the view, and returns the number of bytes copied.
    pub fn copy_to(&self, dest: &mut [u8]) -> usize {
        let n = self.len.min(dest.len());
        dest[..n].copy_from_slice(&self.as_slice()[..n]);
        n
    }

    /// Writes the entire view into `writer`.
    pub fn write_to<W: std::io::Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(self.as_slice())
    }

    /// Consumes the view and returns a cursor implementing [`Read`](std::io::Read),
    /// [`BufRead`](std::io::BufRead) and [`Seek`](std::io::Seek) over its bytes.
    ///
    /// Clone the view first to keep a handle on it; the clone is O(1).
    pub fn reader(self) -> std::io::Cursor<ByteView> {
        std::io::Cursor::new(self)
    }

    /// Reads a value of type `T` from the view at the given byte offset.
    ///
    /// The bytes are copied out, so the underlying storage does not need to be
    /// aligned for `T`.
    ///
    /// # Panics
    ///
    /// Panics if `offset + size_of::<T>()` exceeds the view's length.
    pub fn read_typed<T>(&self, offset: usize) -> T
    where
        T: bytemuck::AnyBitPattern,
    {
        let end = offset
            .checked_add(std::mem::size_of::<T>())
            .expect("out of range");
        bytemuck::pod_read_unaligned(&self.as_slice()[offset..end])
    }

    /// Returns the total allocated size of the shared backing buffer in bytes.
    ///
    /// Clones and sub-views report the same backing allocation; the cache is
    /// responsible for not double-counting storage shared between views.
    pub fn heap_size(&self) -> usize {
        self.data.capacity()
    }

    /// Attempts to consume the view and reclaim the backing vector without
    /// copying.
    ///
    /// Succeeds only when this view is the sole owner of the allocation and
    /// spans all of it; otherwise the view is returned unchanged.
    pub fn try_into_vec(self) -> Result<Vec<u8>, ByteView> {
        let ByteView { data, offset, len } = self;
        if offset != 0 || len != data.len() {
            return Err(ByteView { data, offset, len });
        }
        Arc::try_unwrap(data).map_err(|data| ByteView { data, offset, len })
    }
}

impl Default for ByteView {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for ByteView {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl AsRef<[u8]> for ByteView {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl Borrow<[u8]> for ByteView {
    fn borrow(&self) -> &[u8] {
        self.as_slice()
    }
}

impl From<ByteViewMut> for ByteView {
    fn from(buf: ByteViewMut) -> Self {
        buf.into_view()
    }
}

impl From<Vec<u8>> for ByteView {
    fn from(vec: Vec<u8>) -> Self {
        ByteView::from_vec(vec)
    }
}

impl From<String> for ByteView {
    fn from(s: String) -> Self {
        Self::from(s.into_bytes())
    }
}

impl From<&str> for ByteView {
    fn from(s: &str) -> Self {
        Self::copy_from_slice(s.as_bytes())
    }
}

impl From<&[u8]> for ByteView {
    fn from(s: &[u8]) -> Self {
        Self::copy_from_slice(s)
    }
}

impl fmt::Debug for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ByteView").field(&self.as_slice()).finish()
    }
}

impl fmt::Display for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

impl PartialEq for ByteView {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for ByteView {}

impl PartialEq<[u8]> for ByteView {
    fn eq(&self, other: &[u8]) -> bool {
        self.as_slice() == other
    }
}

impl PartialEq<ByteView> for [u8] {
    fn eq(&self, other: &ByteView) -> bool {
        self == other.as_slice()
    }
}

impl PartialEq<&[u8]> for ByteView {
    fn eq(&self, other: &&[u8]) -> bool {
        self.as_slice() == *other
    }
}

impl PartialEq<Vec<u8>> for ByteView {
    fn eq(&self, other: &Vec<u8>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl PartialEq<str> for ByteView {
    fn eq(&self, other: &str) -> bool {
        self.as_slice() == other.as_bytes()
    }
}

impl PartialEq<&str> for ByteView {
    fn eq(&self, other: &&str) -> bool {
        self.as_slice() == other.as_bytes()
    }
}

impl PartialOrd for ByteView {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ByteView {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_slice().cmp(other.as_slice())
    }
}

impl Hash for ByteView {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state);
    }
}

impl<'a> IntoIterator for &'a ByteView {
    type Item = &'a u8;
    type IntoIter = std::slice::Iter<'a, u8>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

/// By-value iterator over the bytes of a [`ByteView`].
///
/// Holds a reference on the backing allocation, so the view it was created
/// from may be dropped while iteration continues.
#[derive(Clone)]
pub struct ByteViewIter {
    data: Arc<Vec<u8>>,
    offset: usize,
    len: usize,
    pos: usize,
}

impl Iterator for ByteViewIter {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        if self.pos < self.len {
            let byte = self.data[self.offset + self.pos];
            self.pos += 1;
            Some(byte)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.pos;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ByteViewIter {}

impl IntoIterator for ByteView {
    type Item = u8;
    type IntoIter = ByteViewIter;

    fn into_iter(self) -> Self::IntoIter {
        ByteViewIter {
            data: self.data,
            offset: self.offset,
            len: self.len,
            pos: 0,
        }
    }
}
