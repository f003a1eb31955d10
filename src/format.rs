//! Cast wire-format constants and identifier enums.

use std::fmt;

/// Magic value at the start of a Cast file: ASCII "cast", little-endian.
pub const CAST_MAGIC: u32 = 0x7473_6163;

/// Current Cast format version.
pub const CAST_VERSION: u32 = 1;

/// Size of the file header in bytes.
pub const FILE_HEADER_SIZE: usize = 16;

/// Size of the fixed node header in bytes (identifier, size, hash, counts).
pub const NODE_HEADER_SIZE: usize = 24;

/// Size of the fixed property header in bytes (kind, key length, count).
pub const PROPERTY_HEADER_SIZE: usize = 8;

/// Parent index value marking a root bone.
pub const NO_PARENT: u32 = u32::MAX;

/// Node identifier - a 32-bit FourCC tag naming a node kind.
///
/// Identifiers outside the known set are structurally valid and preserved
/// verbatim through [`NodeKind::Unknown`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// `root` - top-level container
    Root,
    /// `modl` - a model (meshes, skeleton, materials)
    Model,
    /// `mesh` - vertex/face buffers
    Mesh,
    /// `hair` - strand geometry
    Hair,
    /// `blsh` - blend shape definition
    BlendShape,
    /// `skel` - skeleton container
    Skeleton,
    /// `bone` - a single joint
    Bone,
    /// `ikhd` - inverse-kinematics handle
    IkHandle,
    /// `cnst` - bone constraint
    Constraint,
    /// `anim` - animation container
    Animation,
    /// `curv` - animation curve
    Curve,
    /// `cMOV` - per-node curve mode override
    CurveModeOverride,
    /// `ntif` - notification (event) track
    NotificationTrack,
    /// `matl` - material
    Material,
    /// `file` - external file reference
    File,
    /// `colr` - named color
    Color,
    /// `inst` - scene instance of a reference file
    Instance,
    /// Any other identifier, carried through unchanged
    Unknown(u32),
}

impl NodeKind {
    /// Map an on-wire identifier to a node kind.
    pub const fn from_id(id: u32) -> Self {
        match id {
            0x746F_6F72 => Self::Root,
            0x6C64_6F6D => Self::Model,
            0x6873_656D => Self::Mesh,
            0x7269_6168 => Self::Hair,
            0x6873_6C62 => Self::BlendShape,
            0x6C65_6B73 => Self::Skeleton,
            0x656E_6F62 => Self::Bone,
            0x6468_6B69 => Self::IkHandle,
            0x7473_6E63 => Self::Constraint,
            0x6D69_6E61 => Self::Animation,
            0x7672_7563 => Self::Curve,
            0x564F_4D63 => Self::CurveModeOverride,
            0x6669_746E => Self::NotificationTrack,
            0x6C74_616D => Self::Material,
            0x656C_6966 => Self::File,
            0x726C_6F63 => Self::Color,
            0x7473_6E69 => Self::Instance,
            other => Self::Unknown(other),
        }
    }

    /// The on-wire identifier for this kind.
    pub const fn id(self) -> u32 {
        match self {
            Self::Root => 0x746F_6F72,
            Self::Model => 0x6C64_6F6D,
            Self::Mesh => 0x6873_656D,
            Self::Hair => 0x7269_6168,
            Self::BlendShape => 0x6873_6C62,
            Self::Skeleton => 0x6C65_6B73,
            Self::Bone => 0x656E_6F62,
            Self::IkHandle => 0x6468_6B69,
            Self::Constraint => 0x7473_6E63,
            Self::Animation => 0x6D69_6E61,
            Self::Curve => 0x7672_7563,
            Self::CurveModeOverride => 0x564F_4D63,
            Self::NotificationTrack => 0x6669_746E,
            Self::Material => 0x6C74_616D,
            Self::File => 0x656C_6966,
            Self::Color => 0x726C_6F63,
            Self::Instance => 0x7473_6E69,
            Self::Unknown(id) => id,
        }
    }

    /// Returns the FourCC name of this kind.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Model => "modl",
            Self::Mesh => "mesh",
            Self::Hair => "hair",
            Self::BlendShape => "blsh",
            Self::Skeleton => "skel",
            Self::Bone => "bone",
            Self::IkHandle => "ikhd",
            Self::Constraint => "cnst",
            Self::Animation => "anim",
            Self::Curve => "curv",
            Self::CurveModeOverride => "cMOV",
            Self::NotificationTrack => "ntif",
            Self::Material => "matl",
            Self::File => "file",
            Self::Color => "colr",
            Self::Instance => "inst",
            Self::Unknown(_) => "unknown",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(id) => write!(f, "0x{id:08X}"),
            known => write!(f, "{}", known.name()),
        }
    }
}

/// Property identifier - a 16-bit tag naming a property's element type.
///
/// The set is closed: a property header carrying any other value is a parse
/// error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    /// `b` - unsigned 8-bit integers
    Byte,
    /// `h` - unsigned 16-bit integers
    Short,
    /// `i` - unsigned 32-bit integers
    Integer32,
    /// `l` - unsigned 64-bit integers
    Integer64,
    /// `f` - 32-bit floats
    Float,
    /// `d` - 64-bit floats
    Double,
    /// `s` - a single null-terminated UTF-8 string
    String,
    /// `v2` - 2-component float vectors
    Vector2,
    /// `v3` - 3-component float vectors
    Vector3,
    /// `v4` - 4-component float vectors
    Vector4,
}

impl PropertyKind {
    /// Map an on-wire property identifier to a kind, if known.
    pub const fn from_id(id: u16) -> Option<Self> {
        match id {
            0x62 => Some(Self::Byte),
            0x68 => Some(Self::Short),
            0x69 => Some(Self::Integer32),
            0x6C => Some(Self::Integer64),
            0x66 => Some(Self::Float),
            0x64 => Some(Self::Double),
            0x73 => Some(Self::String),
            0x7632 => Some(Self::Vector2),
            0x7633 => Some(Self::Vector3),
            0x7634 => Some(Self::Vector4),
            _ => None,
        }
    }

    /// The on-wire identifier for this kind.
    pub const fn id(self) -> u16 {
        match self {
            Self::Byte => 0x62,
            Self::Short => 0x68,
            Self::Integer32 => 0x69,
            Self::Integer64 => 0x6C,
            Self::Float => 0x66,
            Self::Double => 0x64,
            Self::String => 0x73,
            Self::Vector2 => 0x7632,
            Self::Vector3 => 0x7633,
            Self::Vector4 => 0x7634,
        }
    }

    /// On-wire size of one array element in bytes.
    ///
    /// Strings are terminator-delimited rather than fixed width; their
    /// element size is reported as zero.
    pub const fn element_size(self) -> usize {
        match self {
            Self::Byte => 1,
            Self::Short => 2,
            Self::Integer32 => 4,
            Self::Integer64 => 8,
            Self::Float => 4,
            Self::Double => 8,
            Self::String => 0,
            Self::Vector2 => 8,
            Self::Vector3 => 12,
            Self::Vector4 => 16,
        }
    }

    /// Element width in bits for the unsigned integer kinds.
    pub const fn integer_bits(self) -> Option<u32> {
        match self {
            Self::Byte => Some(8),
            Self::Short => Some(16),
            Self::Integer32 => Some(32),
            Self::Integer64 => Some(64),
            _ => None,
        }
    }

    /// The widest integer kind whose elements fit in `max_bits`.
    pub const fn widest_integer(max_bits: u32) -> Self {
        match max_bits {
            0..=8 => Self::Byte,
            9..=16 => Self::Short,
            17..=32 => Self::Integer32,
            _ => Self::Integer64,
        }
    }

    /// Returns the short name of this kind.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Byte => "b",
            Self::Short => "h",
            Self::Integer32 => "i",
            Self::Integer64 => "l",
            Self::Float => "f",
            Self::Double => "d",
            Self::String => "s",
            Self::Vector2 => "v2",
            Self::Vector3 => "v3",
            Self::Vector4 => "v4",
        }
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
