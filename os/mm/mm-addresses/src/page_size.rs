use core::fmt;
use core::hash::Hash;

/// Sealed trait pattern to restrict `PageSize` impls to our markers.
mod sealed {
    pub trait Sealed {}
}

/// Marker trait for supported simulation page sizes.
///
/// The page size is fixed per memory descriptor and physical store, so it is
/// carried at the type level rather than as a runtime value.
pub trait PageSize:
    sealed::Sealed
    + Clone
    + Copy
    + Eq
    + PartialEq
    + Ord
    + PartialOrd
    + Hash
    + Send
    + Sync
    + fmt::Display
    + fmt::Debug
    + 'static
{
    /// Page size in bytes (power of two).
    const SIZE: u32;
    /// log2(SIZE), i.e., number of low bits used for the offset.
    const SHIFT: u32;

    fn as_str() -> &'static str;
}

/// 256 byte page, the default page size of the simulated kernel.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Size256;
impl sealed::Sealed for Size256 {}
impl PageSize for Size256 {
    const SIZE: u32 = 256;
    const SHIFT: u32 = 8;

    fn as_str() -> &'static str {
        "256"
    }
}

/// 512 byte page.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Size512;
impl sealed::Sealed for Size512 {}
impl PageSize for Size512 {
    const SIZE: u32 = 512;
    const SHIFT: u32 = 9;

    fn as_str() -> &'static str {
        "512"
    }
}

/// 4 KiB page (4096 bytes).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Size4K;
impl sealed::Sealed for Size4K {}
impl PageSize for Size4K {
    const SIZE: u32 = 4096;
    const SHIFT: u32 = 12;

    fn as_str() -> &'static str {
        "4K"
    }
}

macro_rules! impl_page_size_fmt {
    ($($ty:ty),+) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                    f.write_str(<$ty as PageSize>::as_str())
                }
            }

            impl fmt::Debug for $ty {
                fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                    fmt::Display::fmt(&self, f)
                }
            }
        )+
    };
}

impl_page_size_fmt!(Size256, Size512, Size4K);

const _: () = {
    assert!(Size256::SIZE == 1 << Size256::SHIFT);
    assert!(Size512::SIZE == 1 << Size512::SHIFT);
    assert!(Size4K::SIZE == 1 << Size4K::SHIFT);
};
