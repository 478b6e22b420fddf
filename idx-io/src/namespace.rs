//! 命名空间与标签表。
//!
//! 所有输出标签都是 [`Tag`] 枚举成员，限定名在首次使用时一次性生成；
//! 字符串形式的查找通过 [`resolve_tag`] 完成，跨命名空间重名的本地名会被报告为歧义。

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Foundation,
    Pdm,
    D2,
    Property,
    Computational,
    Administration,
    Xsi,
}

impl Namespace {
    /// 根元素上的声明顺序。
    pub const ALL: [Namespace; 7] = [
        Namespace::Foundation,
        Namespace::Pdm,
        Namespace::D2,
        Namespace::Property,
        Namespace::Computational,
        Namespace::Administration,
        Namespace::Xsi,
    ];

    pub fn prefix(self) -> &'static str {
        match self {
            Namespace::Foundation => "foundation",
            Namespace::Pdm => "pdm",
            Namespace::D2 => "d2",
            Namespace::Property => "property",
            Namespace::Computational => "computational",
            Namespace::Administration => "administration",
            Namespace::Xsi => "xsi",
        }
    }

    pub fn uri(self) -> &'static str {
        match self {
            Namespace::Foundation => "http://www.prostep.org/EDMD/3.0/foundation",
            Namespace::Pdm => "http://www.prostep.org/EDMD/3.0/pdm",
            Namespace::D2 => "http://www.prostep.org/EDMD/3.0/geometry/d2",
            Namespace::Property => "http://www.prostep.org/EDMD/3.0/property",
            Namespace::Computational => "http://www.prostep.org/EDMD/3.0/computational",
            Namespace::Administration => "http://www.prostep.org/EDMD/3.0/administration",
            Namespace::Xsi => "http://www.w3.org/2001/XMLSchema-instance",
        }
    }

    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Namespace::ALL
            .into_iter()
            .find(|namespace| namespace.prefix() == prefix)
    }

    pub fn is_reserved_prefix(prefix: &str) -> bool {
        Self::from_prefix(prefix).is_some()
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

macro_rules! define_tags {
    ($($variant:ident => $namespace:ident : $local:literal,)+) => {
        /// 输出中出现的全部元素名与类型名。
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Tag {
            $($variant,)+
        }

        impl Tag {
            pub const ALL: &'static [Tag] = &[$(Tag::$variant,)+];

            pub fn namespace(self) -> Namespace {
                match self {
                    $(Tag::$variant => Namespace::$namespace,)+
                }
            }

            pub fn local_name(self) -> &'static str {
                match self {
                    $(Tag::$variant => $local,)+
                }
            }
        }
    };
}

define_tags! {
    // foundation
    DataSet => Foundation: "EDMDDataSet",
    Header => Foundation: "Header",
    HeaderType => Foundation: "EDMDHeader",
    Body => Foundation: "Body",
    BodyType => Foundation: "EDMDDataSetBody",
    ProcessInstruction => Foundation: "ProcessInstruction",
    Description => Foundation: "Description",
    CreatorName => Foundation: "CreatorName",
    CreatorCompany => Foundation: "CreatorCompany",
    CreatorSystem => Foundation: "CreatorSystem",
    GlobalUnitLength => Foundation: "GlobalUnitLength",
    CreationDateTime => Foundation: "CreationDateTime",
    ModifiedDateTime => Foundation: "ModifiedDateTime",
    CartesianPoint => Foundation: "CartesianPoint",
    Line => Foundation: "Line",
    Arc => Foundation: "Arc",
    CircleCenter => Foundation: "CircleCenter",
    PolyLine => Foundation: "PolyLine",
    CurveSet2d => Foundation: "CurveSet2d",
    ShapeElement => Foundation: "ShapeElement",
    Stratum => Foundation: "Stratum",
    AssemblyComponent => Foundation: "AssemblyComponent",
    InterStratumFeature => Foundation: "InterStratumFeature",
    KeepOut => Foundation: "KeepOut",
    KeepIn => Foundation: "KeepIn",
    FunctionalItemShape => Foundation: "FunctionalItemShape",
    StratumTechnology => Foundation: "StratumTechnology",
    Model3D => Foundation: "Model3D",
    Item => Foundation: "Item",
    Name => Foundation: "Name",
    NameType => Foundation: "EDMDName",
    SystemScope => Foundation: "SystemScope",
    ObjectName => Foundation: "ObjectName",
    Number => Foundation: "Number",
    Version => Foundation: "Version",
    Revision => Foundation: "Revision",
    Sequence => Foundation: "Sequence",
    IdentifierType => Foundation: "EDMDIdentifier",
    UserProperty => Foundation: "UserProperty",
    // pdm
    ItemType => Pdm: "EDMDItem",
    ItemKindTag => Pdm: "ItemType",
    Identifier => Pdm: "Identifier",
    ItemInstance => Pdm: "ItemInstance",
    ItemInstanceType => Pdm: "EDMDItemInstance",
    InstanceItem => Pdm: "Item",
    InstanceName => Pdm: "InstanceName",
    Transformation => Pdm: "Transformation",
    TransformationType => Pdm: "EDMDTransformation",
    TransformationKind => Pdm: "TransformationType",
    Xx => Pdm: "xx",
    Xy => Pdm: "xy",
    Xz => Pdm: "xz",
    Yx => Pdm: "yx",
    Yy => Pdm: "yy",
    Yz => Pdm: "yz",
    Zx => Pdm: "zx",
    Zy => Pdm: "zy",
    Zz => Pdm: "zz",
    Tx => Pdm: "tx",
    Ty => Pdm: "ty",
    Tz => Pdm: "tz",
    ZOffset => Pdm: "zOffset",
    Shape => Pdm: "Shape",
    PackageName => Pdm: "PackageName",
    PackagePin => Pdm: "PackagePin",
    PackagePinType => Pdm: "EDMDPackagePin",
    PinPoint => Pdm: "Point",
    ItemModel => Pdm: "EDMD3DModel",
    ShapeDescriptionType => Pdm: "ShapeDescriptionType",
    ShapeElementKind => Pdm: "ShapeElementType",
    ShapeElementType => Pdm: "EDMDShapeElement",
    Inverted => Pdm: "Inverted",
    DefiningShape => Pdm: "DefiningShape",
    StratumType => Pdm: "EDMDStratum",
    ShapeElementRef => Pdm: "ShapeElement",
    StratumRef => Pdm: "Stratum",
    StratumTechnologyRef => Pdm: "StratumTechnology",
    StratumSurfaceDesignation => Pdm: "StratumSurfaceDesignation",
    AssemblyComponentType => Pdm: "EDMDAssemblyComponent",
    InterStratumFeatureType => Pdm: "EDMDInterStratumFeature",
    InterStratumFeatureKind => Pdm: "InterStratumFeatureType",
    KeepOutType => Pdm: "EDMDKeepOut",
    KeepInType => Pdm: "EDMDKeepIn",
    Purpose => Pdm: "Purpose",
    FunctionalItemShapeType => Pdm: "EDMDFunctionalItemShape",
    FunctionalItemShapeKind => Pdm: "FunctionalItemShapeType",
    StratumTechnologyType => Pdm: "EDMDStratumTechnology",
    TechnologyType => Pdm: "TechnologyType",
    LayerPurpose => Pdm: "LayerPurpose",
    Model3DType => Pdm: "EDMDModel3D",
    ModelIdentifier => Pdm: "ModelIdentifier",
    McadFormat => Pdm: "MCADFormat",
    McadFormatVersion => Pdm: "MCADFormatVersion",
    ModelLocation => Pdm: "ModelLocation",
    // d2
    CartesianPointType => D2: "EDMDCartesianPoint",
    X => D2: "X",
    Y => D2: "Y",
    LineType => D2: "EDMDLine",
    StartPoint => D2: "StartPoint",
    EndPoint => D2: "EndPoint",
    ArcType => D2: "EDMDArc",
    CenterPoint => D2: "CenterPoint",
    RadiusX => D2: "RadiusX",
    RadiusY => D2: "RadiusY",
    StartAngle => D2: "StartAngle",
    SweepAngle => D2: "SweepAngle",
    CircleCenterType => D2: "EDMDCircleCenter",
    Diameter => D2: "Diameter",
    PolyLineType => D2: "EDMDPolyLine",
    Point => D2: "Point",
    CurveSet2dType => D2: "EDMDCurveSet2d",
    LowerBound => D2: "LowerBound",
    UpperBound => D2: "UpperBound",
    DetailedGeometricModelElement => D2: "DetailedGeometricModelElement",
    // property
    LengthProperty => Property: "EDMDLengthProperty",
    Value => Property: "Value",
    UserSimpleProperty => Property: "EDMDUserSimpleProperty",
    Key => Property: "Key",
    IsChanged => Property: "IsChanged",
    IsNew => Property: "IsNew",
    // computational
    SendInformation => Computational: "EDMDProcessInstructionSendInformation",
    // xsi
    XsiType => Xsi: "type",
}

static QUALIFIED: Lazy<Vec<String>> = Lazy::new(|| {
    Tag::ALL
        .iter()
        .map(|tag| format!("{}:{}", tag.namespace().prefix(), tag.local_name()))
        .collect()
});

static LOCAL_INDEX: Lazy<HashMap<&'static str, Vec<Namespace>>> = Lazy::new(|| {
    let mut index: HashMap<&'static str, Vec<Namespace>> = HashMap::new();
    for tag in Tag::ALL {
        let namespaces = index.entry(tag.local_name()).or_default();
        if !namespaces.contains(&tag.namespace()) {
            namespaces.push(tag.namespace());
        }
    }
    index
});

impl Tag {
    /// `prefix:local` 形式的限定名。
    pub fn qualified(self) -> &'static str {
        QUALIFIED[self as usize].as_str()
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.qualified())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NamespaceError {
    #[error("unknown tag `{0}`")]
    UnknownTag(String),
    #[error("tag `{tag}` is defined in several namespaces: {candidates:?}")]
    AmbiguousTag {
        tag: String,
        candidates: Vec<Namespace>,
    },
}

/// 按本地名（或 `prefix:local` 限定名）查找标签所属的命名空间。
pub fn resolve_tag(name: &str) -> Result<Namespace, NamespaceError> {
    if let Some((prefix, local)) = name.split_once(':') {
        let namespace = Namespace::from_prefix(prefix)
            .ok_or_else(|| NamespaceError::UnknownTag(name.to_string()))?;
        return match LOCAL_INDEX.get(local) {
            Some(candidates) if candidates.contains(&namespace) => Ok(namespace),
            _ => Err(NamespaceError::UnknownTag(name.to_string())),
        };
    }
    match LOCAL_INDEX.get(name).map(Vec::as_slice) {
        None | Some([]) => Err(NamespaceError::UnknownTag(name.to_string())),
        Some([namespace]) => Ok(*namespace),
        Some(candidates) => Err(NamespaceError::AmbiguousTag {
            tag: name.to_string(),
            candidates: candidates.to_vec(),
        }),
    }
}
