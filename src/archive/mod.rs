mod descriptor;
mod format;

pub use descriptor::{
    normalize_member_name, Descriptor, Member, MemberKind, TarDescriptor, ZipDescriptor,
};
pub use format::{ArchiveFormat, EXTRACTORS};
