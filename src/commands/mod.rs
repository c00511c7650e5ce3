//! CLI command implementations
//!
//! Every command takes descriptor strings as they are read from a device's
//! alternate settings (for example with `lsusb -v` or `dfu-util -l`) and
//! works on the parsed memory layout.

pub mod layout;
