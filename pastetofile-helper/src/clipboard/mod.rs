//! Live clipboard backends. Windows reads the native formats directly;
//! elsewhere `arboard` covers text and images.

#[cfg(target_os = "windows")]
mod win32;
#[cfg(target_os = "windows")]
pub use self::win32::SystemClipboard;

#[cfg(not(target_os = "windows"))]
mod portable;
#[cfg(not(target_os = "windows"))]
pub use self::portable::SystemClipboard;
