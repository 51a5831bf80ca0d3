//! Local build bookkeeping for hoist.
//!
//! # Build phase
//!
//! ```text
//! hoist build
//!   1. Descriptor ── Dockerfile must exist in the working directory
//!   2. Buildx     ── docker buildx version / inspect / create / use
//!   3. Build      ── docker buildx build --platform … -t <image>:<tag> --load .
//!   4. Tag        ── docker tag <image>:<tag> <registry>/<image>:<tag>
//!   5. Record     ── .hoist/last-tag
//! ```
//!
//! Steps 2-4 talk to docker and live in `hoist-cloud`; this crate owns the
//! filesystem side (1 and 5).

pub mod descriptor;
pub mod tag_file;

pub use descriptor::{DescriptorError, locate_descriptor};
pub use tag_file::{TagFileError, read_last_tag, tag_file_path, write_last_tag};
