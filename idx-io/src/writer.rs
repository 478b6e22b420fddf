//! IDX 文档序列化。
//!
//! 每次调用 [`IdxWriter::serialize`] 都创建一个栈上的 [`WriteContext`]，遍历过程中不保存任何实例状态，
//! 同一个写出器可以在多个线程上并发使用。

use chrono::{DateTime, SecondsFormat, Utc};
use idx_config::{NumberFormatting, WriteConfig};
use idx_core::document::{
    CurveSet, Geometry, GeometryKind, Header, IdxDocument, IdxId, Identifier, Item, ItemInstance,
    ItemKind, Model3D, PackagePin, PropertyValue, ShapeElement, ThirdItem, ThirdItemKind,
    Transformation, UserProperty,
};
use tracing::{debug, warn};

use crate::IoError;
use crate::namespace::{Namespace, Tag};
use crate::xml::XmlNode;

/// 按固定小数位格式化数值，可选去掉末尾的 0，并把 `-0` 规范为 `0`。
pub fn format_number(value: f64, formatting: &NumberFormatting) -> String {
    let mut text = format!("{:.*}", formatting.decimal_places as usize, value);
    if formatting.remove_trailing_zeros && text.contains('.') {
        let trimmed = text.trim_end_matches('0').trim_end_matches('.').len();
        text.truncate(trimmed);
    }
    if let Some(magnitude) = text.strip_prefix('-') {
        if magnitude.chars().all(|c| c == '0' || c == '.') {
            text.remove(0);
        }
    }
    text
}

pub fn format_bool(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[derive(Debug, Clone, Default)]
pub struct IdxWriter {
    config: WriteConfig,
}

impl IdxWriter {
    pub fn new(config: WriteConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WriteConfig {
        &self.config
    }

    /// 构建元素树但不写出，便于检查结构。
    pub fn to_tree(&self, document: &IdxDocument) -> XmlNode {
        debug_assert!(
            document.check_references().is_ok(),
            "document graph has unresolved references"
        );
        WriteContext::new(&self.config).dataset(document)
    }

    pub fn serialize(&self, document: &IdxDocument) -> Result<String, IoError> {
        let tree = self.to_tree(document);
        let bytes = tree.to_document(self.config.pretty_print)?;
        let text = String::from_utf8(bytes)?;
        debug!(
            entities = document.entity_count(),
            bytes = text.len(),
            "IDX 序列化完成"
        );
        Ok(text)
    }
}

/// 单次序列化的工作状态。
struct WriteContext<'a> {
    config: &'a WriteConfig,
}

impl<'a> WriteContext<'a> {
    fn new(config: &'a WriteConfig) -> Self {
        Self { config }
    }

    fn number(&self, value: f64) -> String {
        format_number(value, &self.config.number_formatting)
    }

    fn leaf(&self, tag: Tag, text: impl Into<String>) -> XmlNode {
        XmlNode::tag(tag).text(text)
    }

    fn reference(&self, tag: Tag, id: IdxId) -> XmlNode {
        XmlNode::tag(tag).text(id.to_string())
    }

    fn real(&self, tag: Tag, value: f64) -> XmlNode {
        self.leaf(tag, self.number(value))
    }

    fn boolean(&self, tag: Tag, value: bool) -> XmlNode {
        self.leaf(tag, format_bool(value))
    }

    fn length(&self, tag: Tag, value: f64) -> XmlNode {
        XmlNode::typed(tag, Tag::LengthProperty).child(self.real(Tag::Value, value))
    }

    fn entity(&self, tag: Tag, xsi_type: Tag, id: IdxId) -> XmlNode {
        XmlNode::tag(tag)
            .attr("id", id.to_string())
            .attr(Tag::XsiType.qualified(), xsi_type.qualified())
    }

    fn dataset(&self, document: &IdxDocument) -> XmlNode {
        let mut root = XmlNode::tag(Tag::DataSet);
        for namespace in Namespace::ALL {
            root = root.attr(format!("xmlns:{}", namespace.prefix()), namespace.uri());
        }
        for (prefix, uri) in &self.config.extra_namespaces {
            if Namespace::is_reserved_prefix(prefix) {
                warn!(prefix = %prefix, uri = %uri, "额外命名空间与保留前缀冲突，已跳过");
                continue;
            }
            root = root.attr(format!("xmlns:{prefix}"), uri.as_str());
        }
        root.child(self.header(&document.header))
            .child(self.body(document))
            .child(self.process_instruction(document))
    }

    fn header(&self, header: &Header) -> XmlNode {
        XmlNode::typed(Tag::Header, Tag::HeaderType).children([
            self.leaf(Tag::Description, header.description.as_str()),
            self.leaf(Tag::CreatorName, header.creator_name.as_str()),
            self.leaf(Tag::CreatorCompany, header.creator_company.as_str()),
            self.leaf(Tag::CreatorSystem, header.creator_system.as_str()),
            self.leaf(
                Tag::GlobalUnitLength,
                header.global_unit_length.as_idx_str(),
            ),
            self.leaf(
                Tag::CreationDateTime,
                format_timestamp(&header.creation_date_time),
            ),
            self.leaf(
                Tag::ModifiedDateTime,
                format_timestamp(&header.modified_date_time),
            ),
        ])
    }

    fn process_instruction(&self, document: &IdxDocument) -> XmlNode {
        let node = XmlNode::typed(Tag::ProcessInstruction, Tag::SendInformation);
        match &document.process_instruction.description {
            Some(description) => node.child(self.leaf(Tag::Description, description.as_str())),
            None => node,
        }
    }

    fn body(&self, document: &IdxDocument) -> XmlNode {
        let mut body = XmlNode::typed(Tag::Body, Tag::BodyType);
        let sections: [(&str, Vec<XmlNode>); 10] = [
            (
                "Points",
                document
                    .points()
                    .iter()
                    .map(|point| {
                        self.entity(Tag::CartesianPoint, Tag::CartesianPointType, point.id)
                            .child(self.length(Tag::X, point.x))
                            .child(self.length(Tag::Y, point.y))
                    })
                    .collect(),
            ),
            (
                "Geometries",
                document
                    .geometries()
                    .iter()
                    .map(|geometry| self.geometry(geometry))
                    .collect(),
            ),
            (
                "CurveSets",
                document
                    .curve_sets()
                    .iter()
                    .map(|set| self.curve_set(set))
                    .collect(),
            ),
            (
                "ShapeElements",
                document
                    .shape_elements()
                    .iter()
                    .map(|element| self.shape_element(element))
                    .collect(),
            ),
            (
                "ThirdItems",
                document
                    .third_items()
                    .iter()
                    .map(|third| self.third_item(third))
                    .collect(),
            ),
            (
                "Layers",
                document.layers().iter().map(|item| self.item(item)).collect(),
            ),
            (
                "Models3D",
                document.models().iter().map(|model| self.model(model)).collect(),
            ),
            (
                "Packages",
                document
                    .packages()
                    .iter()
                    .map(|item| self.item(item))
                    .collect(),
            ),
            (
                "ItemSingles",
                document.singles().iter().map(|item| self.item(item)).collect(),
            ),
            (
                "ItemAssemblies",
                document
                    .assemblies()
                    .iter()
                    .map(|item| self.item(item))
                    .collect(),
            ),
        ];

        for (label, nodes) in sections {
            let mut nodes = nodes.into_iter();
            if let Some(first) = nodes.next() {
                let first = if self.config.enable_comments {
                    first.with_comment(label)
                } else {
                    first
                };
                body.push(first);
                body.children.extend(nodes);
            }
        }
        body
    }

    fn geometry(&self, geometry: &Geometry) -> XmlNode {
        match &geometry.kind {
            GeometryKind::Line { start, end } => self
                .entity(Tag::Line, Tag::LineType, geometry.id)
                .child(self.reference(Tag::StartPoint, *start))
                .child(self.reference(Tag::EndPoint, *end)),
            GeometryKind::Arc {
                center,
                radius_x,
                radius_y,
                start_angle,
                sweep_angle,
            } => self
                .entity(Tag::Arc, Tag::ArcType, geometry.id)
                .child(self.reference(Tag::CenterPoint, *center))
                .child(self.length(Tag::RadiusX, *radius_x))
                .child(self.length(Tag::RadiusY, *radius_y))
                .child(self.real(Tag::StartAngle, start_angle.to_degrees()))
                .child(self.real(Tag::SweepAngle, sweep_angle.to_degrees())),
            GeometryKind::Circle { center, radius } => self
                .entity(Tag::CircleCenter, Tag::CircleCenterType, geometry.id)
                .child(self.reference(Tag::CenterPoint, *center))
                .child(self.length(Tag::Diameter, radius * 2.0)),
            GeometryKind::PolyLine { points } => self
                .entity(Tag::PolyLine, Tag::PolyLineType, geometry.id)
                .children(points.iter().map(|point| self.reference(Tag::Point, *point))),
        }
    }

    fn curve_set(&self, set: &CurveSet) -> XmlNode {
        self.entity(Tag::CurveSet2d, Tag::CurveSet2dType, set.id)
            .child(self.leaf(
                Tag::ShapeDescriptionType,
                set.shape_description_type.as_str(),
            ))
            .child(self.length(Tag::LowerBound, set.lower_bound))
            .child(self.length(Tag::UpperBound, set.upper_bound))
            .children(
                set.geometries
                    .iter()
                    .map(|id| self.reference(Tag::DetailedGeometricModelElement, *id)),
            )
    }

    fn shape_element(&self, element: &ShapeElement) -> XmlNode {
        self.entity(Tag::ShapeElement, Tag::ShapeElementType, element.id)
            .child(self.leaf(Tag::ShapeElementKind, element.element_type.as_str()))
            .child(self.boolean(Tag::Inverted, element.inverted))
            .child(self.reference(Tag::DefiningShape, element.curve_set))
    }

    fn third_item(&self, third: &ThirdItem) -> XmlNode {
        let named = |tag: Tag, xsi_type: Tag| {
            self.entity(tag, xsi_type, third.id)
                .child(self.leaf(Tag::Name, third.name.as_str()))
        };
        match &third.kind {
            ThirdItemKind::Stratum {
                shape_elements,
                surface,
                technology,
            } => {
                let mut node = named(Tag::Stratum, Tag::StratumType).children(
                    shape_elements
                        .iter()
                        .map(|id| self.reference(Tag::ShapeElementRef, *id)),
                );
                if let Some(surface) = surface {
                    node.push(self.leaf(Tag::StratumSurfaceDesignation, surface.as_str()));
                }
                if let Some(technology) = technology {
                    node.push(self.reference(Tag::StratumTechnologyRef, *technology));
                }
                node
            }
            ThirdItemKind::AssemblyComponent { shape_element } => {
                named(Tag::AssemblyComponent, Tag::AssemblyComponentType)
                    .child(self.reference(Tag::ShapeElementRef, *shape_element))
            }
            ThirdItemKind::InterStratumFeature {
                shape_element,
                feature_type,
                stratum,
            } => named(Tag::InterStratumFeature, Tag::InterStratumFeatureType)
                .child(self.reference(Tag::ShapeElementRef, *shape_element))
                .child(self.leaf(Tag::InterStratumFeatureKind, feature_type.as_str()))
                .child(self.reference(Tag::StratumRef, *stratum)),
            ThirdItemKind::KeepOut {
                shape_element,
                purpose,
            } => named(Tag::KeepOut, Tag::KeepOutType)
                .child(self.reference(Tag::ShapeElementRef, *shape_element))
                .child(self.leaf(Tag::Purpose, purpose.as_str())),
            ThirdItemKind::KeepIn {
                shape_element,
                purpose,
            } => named(Tag::KeepIn, Tag::KeepInType)
                .child(self.reference(Tag::ShapeElementRef, *shape_element))
                .child(self.leaf(Tag::Purpose, purpose.as_str())),
            ThirdItemKind::FunctionalItemShape {
                shape_element,
                functional_type,
            } => named(Tag::FunctionalItemShape, Tag::FunctionalItemShapeType)
                .child(self.reference(Tag::ShapeElementRef, *shape_element))
                .child(self.leaf(Tag::FunctionalItemShapeKind, functional_type.as_str())),
            ThirdItemKind::StratumTechnology {
                technology_type,
                layer_purpose,
            } => named(Tag::StratumTechnology, Tag::StratumTechnologyType)
                .child(self.leaf(Tag::TechnologyType, technology_type.as_str()))
                .child(self.leaf(Tag::LayerPurpose, layer_purpose.as_str())),
        }
    }

    fn model(&self, model: &Model3D) -> XmlNode {
        let mut node = self
            .entity(Tag::Model3D, Tag::Model3DType, model.id)
            .child(self.leaf(Tag::ModelIdentifier, model.identifier.as_str()))
            .child(self.leaf(Tag::McadFormat, model.format.as_str()));
        if let Some(version) = &model.version {
            node.push(self.leaf(Tag::McadFormatVersion, version.as_str()));
        }
        if let Some(location) = &model.location {
            node.push(self.leaf(Tag::ModelLocation, location.as_str()));
        }
        if let Some(transformation) = &model.transformation {
            node.push(self.transformation(transformation));
        }
        node
    }

    fn item(&self, item: &Item) -> XmlNode {
        let mut node = XmlNode::tag(Tag::Item).attr("id", item.id.to_string());
        if let Some(geometry_type) = item.geometry_type() {
            node = node.attr("geometryType", geometry_type.as_idx_string());
        }
        node = node
            .attr(Tag::XsiType.qualified(), Tag::ItemType.qualified())
            .child(self.leaf(Tag::Name, item.name.as_str()))
            .child(self.leaf(
                Tag::ItemKindTag,
                if item.is_assembly() { "assembly" } else { "single" },
            ));
        if let Some(identifier) = &item.identifier {
            node.push(self.identifier(identifier));
        }
        node = node.children(
            item.user_properties
                .iter()
                .map(|property| self.user_property(property)),
        );

        match &item.kind {
            ItemKind::Single {
                shape,
                package_name,
                model3d,
                package_pins,
            } => {
                node.push(self.reference(Tag::Shape, *shape));
                if let Some(package_name) = package_name {
                    node.push(self.leaf(Tag::PackageName, package_name.as_str()));
                }
                node = node.children(package_pins.iter().map(|pin| self.package_pin(pin)));
                if let Some(model3d) = model3d {
                    node.push(self.reference(Tag::ItemModel, *model3d));
                }
            }
            ItemKind::Assembly {
                instances, shape, ..
            } => {
                if let Some(shape) = shape {
                    node.push(self.reference(Tag::Shape, *shape));
                }
                node = node.children(instances.iter().map(|instance| self.instance(instance)));
            }
        }
        node
    }

    fn identifier(&self, identifier: &Identifier) -> XmlNode {
        XmlNode::typed(Tag::Identifier, Tag::IdentifierType).children([
            self.leaf(Tag::SystemScope, identifier.system_scope.as_str()),
            self.leaf(Tag::Number, identifier.number.as_str()),
            self.leaf(Tag::Version, identifier.version.to_string()),
            self.leaf(Tag::Revision, identifier.revision.to_string()),
            self.leaf(Tag::Sequence, identifier.sequence.to_string()),
        ])
    }

    fn user_property(&self, property: &UserProperty) -> XmlNode {
        let key = XmlNode::typed(Tag::Key, Tag::NameType)
            .child(self.leaf(Tag::SystemScope, property.key.system_scope.as_str()))
            .child(self.leaf(Tag::ObjectName, property.key.object_name.as_str()));
        let value = match &property.value {
            PropertyValue::Text(text) => self.leaf(Tag::Value, text.as_str()),
            PropertyValue::Length(value) => self.length(Tag::Value, *value),
            PropertyValue::Real(value) => self.real(Tag::Value, *value),
            PropertyValue::Integer(value) => self.leaf(Tag::Value, value.to_string()),
            PropertyValue::Boolean(value) => self.boolean(Tag::Value, *value),
        };
        let mut node = XmlNode::typed(Tag::UserProperty, Tag::UserSimpleProperty)
            .child(key)
            .child(value);
        if let Some(changed) = property.is_changed {
            node.push(self.boolean(Tag::IsChanged, changed));
        }
        if let Some(new) = property.is_new {
            node.push(self.boolean(Tag::IsNew, new));
        }
        node
    }

    fn package_pin(&self, pin: &PackagePin) -> XmlNode {
        let node = XmlNode::typed(Tag::PackagePin, Tag::PackagePinType)
            .attr("pinNumber", pin.pin_number.as_str())
            .attr("primary", format_bool(pin.primary))
            .child(self.reference(Tag::PinPoint, pin.point));
        match pin.shape {
            Some(shape) => node.child(self.reference(Tag::Shape, shape)),
            None => node,
        }
    }

    fn instance(&self, instance: &ItemInstance) -> XmlNode {
        let mut node = self
            .entity(Tag::ItemInstance, Tag::ItemInstanceType, instance.id)
            .child(self.reference(Tag::InstanceItem, instance.item))
            .child(
                XmlNode::typed(Tag::InstanceName, Tag::NameType)
                    .child(self.leaf(Tag::ObjectName, instance.name.as_str())),
            );
        if let Some(transformation) = &instance.transformation {
            node.push(self.transformation(transformation));
        }
        if let Some(z_offset) = instance.z_offset {
            node.push(self.length(Tag::ZOffset, z_offset));
        }
        node.children(
            instance
                .user_properties
                .iter()
                .map(|property| self.user_property(property)),
        )
    }

    fn transformation(&self, transformation: &Transformation) -> XmlNode {
        let node = XmlNode::typed(Tag::Transformation, Tag::TransformationType);
        match transformation {
            Transformation::D2 {
                xx,
                xy,
                yx,
                yy,
                tx,
                ty,
            } => node.children([
                self.leaf(Tag::TransformationKind, "d2"),
                self.real(Tag::Xx, *xx),
                self.real(Tag::Xy, *xy),
                self.real(Tag::Yx, *yx),
                self.real(Tag::Yy, *yy),
                self.length(Tag::Tx, *tx),
                self.length(Tag::Ty, *ty),
            ]),
            Transformation::D3 {
                rotation,
                tx,
                ty,
                tz,
            } => {
                let cells = [
                    [Tag::Xx, Tag::Xy, Tag::Xz],
                    [Tag::Yx, Tag::Yy, Tag::Yz],
                    [Tag::Zx, Tag::Zy, Tag::Zz],
                ];
                let mut node = node.child(self.leaf(Tag::TransformationKind, "d3"));
                for (row, tags) in rotation.iter().zip(cells) {
                    for (value, tag) in row.iter().zip(tags) {
                        node.push(self.real(tag, *value));
                    }
                }
                node.children([
                    self.length(Tag::Tx, *tx),
                    self.length(Tag::Ty, *ty),
                    self.length(Tag::Tz, *tz),
                ])
            }
        }
    }
}
