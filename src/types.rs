//! Protobuf type lookups shared by the template helpers
//!
//! [`TypeIndex`] maps fully-qualified type names (`.pkg.Outer.Inner`) to the
//! file that declares them so templates can link across files.

use std::collections::HashMap;

use prost_types::field_descriptor_proto::Type;
use prost_types::{DescriptorProto, FileDescriptorProto};
use serde::Serialize;

/// What kind of declaration a type name refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    /// A message, possibly nested
    Message,
    /// An enum, top-level or nested in a message
    Enum,
    /// A service
    Service,
}

/// One declared type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeEntry {
    /// Fully-qualified name with a leading dot, e.g. `.shop.Order.Item`
    pub full_name: String,
    /// Name relative to the package, e.g. `Order.Item`
    pub name: String,
    /// Declaring package, empty when the file has none
    pub package: String,
    /// Name of the declaring proto file
    pub file: String,
    /// Declaration kind
    pub kind: TypeKind,
}

/// Index of every type declared by a set of files
#[derive(Debug, Default)]
pub struct TypeIndex {
    types: HashMap<String, TypeEntry>,
}

impl TypeIndex {
    /// Index messages, enums and services of `files`
    ///
    /// When two files declare the same full name the later file wins.
    pub fn build(files: &[FileDescriptorProto]) -> Self {
        let mut index = Self::default();
        for file in files {
            for message in &file.message_type {
                index.add_message(file, "", message);
            }
            for enum_type in &file.enum_type {
                index.insert(file, enum_type.name().to_string(), TypeKind::Enum);
            }
            for service in &file.service {
                index.insert(file, service.name().to_string(), TypeKind::Service);
            }
        }
        index
    }

    /// Look up a type by full name, with or without the leading dot
    pub fn get(&self, name: &str) -> Option<&TypeEntry> {
        if name.starts_with('.') {
            self.types.get(name)
        } else {
            self.types.get(&format!(".{name}"))
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.types.len()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    fn add_message(&mut self, file: &FileDescriptorProto, parent: &str, message: &DescriptorProto) {
        let name = qualify(parent, message.name());
        for nested in &message.nested_type {
            self.add_message(file, &name, nested);
        }
        for enum_type in &message.enum_type {
            self.insert(file, qualify(&name, enum_type.name()), TypeKind::Enum);
        }
        self.insert(file, name, TypeKind::Message);
    }

    fn insert(&mut self, file: &FileDescriptorProto, name: String, kind: TypeKind) {
        let package = file.package();
        let full_name = if package.is_empty() {
            format!(".{name}")
        } else {
            format!(".{package}.{name}")
        };
        self.types.insert(
            full_name.clone(),
            TypeEntry {
                full_name,
                name,
                package: package.to_string(),
                file: file.name().to_string(),
                kind,
            },
        );
    }
}

fn qualify(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

/// The proto spelling of a scalar field type
///
/// Returns None for messages, enums and groups, which are named by
/// `type_name` instead.
pub fn scalar_name(ty: Type) -> Option<&'static str> {
    match ty {
        Type::Double => Some("double"),
        Type::Float => Some("float"),
        Type::Int64 => Some("int64"),
        Type::Uint64 => Some("uint64"),
        Type::Int32 => Some("int32"),
        Type::Fixed64 => Some("fixed64"),
        Type::Fixed32 => Some("fixed32"),
        Type::Bool => Some("bool"),
        Type::String => Some("string"),
        Type::Bytes => Some("bytes"),
        Type::Uint32 => Some("uint32"),
        Type::Sfixed32 => Some("sfixed32"),
        Type::Sfixed64 => Some("sfixed64"),
        Type::Sint32 => Some("sint32"),
        Type::Sint64 => Some("sint64"),
        Type::Group | Type::Message | Type::Enum => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost_types::{EnumDescriptorProto, ServiceDescriptorProto};

    fn file() -> FileDescriptorProto {
        FileDescriptorProto {
            name: Some("shop/order.proto".to_string()),
            package: Some("shop".to_string()),
            message_type: vec![DescriptorProto {
                name: Some("Order".to_string()),
                nested_type: vec![DescriptorProto {
                    name: Some("Item".to_string()),
                    ..Default::default()
                }],
                enum_type: vec![EnumDescriptorProto {
                    name: Some("State".to_string()),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            enum_type: vec![EnumDescriptorProto {
                name: Some("Currency".to_string()),
                ..Default::default()
            }],
            service: vec![ServiceDescriptorProto {
                name: Some("OrderService".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_indexes_all_declarations() {
        let index = TypeIndex::build(&[file()]);
        assert_eq!(index.len(), 5);

        let item = index.get(".shop.Order.Item").unwrap();
        assert_eq!(item.name, "Order.Item");
        assert_eq!(item.kind, TypeKind::Message);
        assert_eq!(item.file, "shop/order.proto");

        assert_eq!(index.get(".shop.Order.State").unwrap().kind, TypeKind::Enum);
        assert_eq!(index.get(".shop.Currency").unwrap().kind, TypeKind::Enum);
        assert_eq!(index.get(".shop.OrderService").unwrap().kind, TypeKind::Service);
    }

    #[test]
    fn test_lookup_without_leading_dot() {
        let index = TypeIndex::build(&[file()]);
        assert_eq!(index.get("shop.Order").unwrap().full_name, ".shop.Order");
    }

    #[test]
    fn test_file_without_package() {
        let f = FileDescriptorProto {
            name: Some("plain.proto".to_string()),
            message_type: vec![DescriptorProto {
                name: Some("Thing".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        };
        let index = TypeIndex::build(&[f]);
        let thing = index.get(".Thing").unwrap();
        assert_eq!(thing.package, "");
        assert_eq!(thing.name, "Thing");
    }

    #[test]
    fn test_empty_index() {
        assert!(TypeIndex::build(&[]).is_empty());
    }

    #[test]
    fn test_scalar_name() {
        assert_eq!(scalar_name(Type::Int32), Some("int32"));
        assert_eq!(scalar_name(Type::Bytes), Some("bytes"));
        assert_eq!(scalar_name(Type::Message), None);
    }
}
