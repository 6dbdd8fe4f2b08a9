//! Class registry: every type a session can name.
//!
//! Holds the builtin `java.lang`/`java.util` classes and any host classes
//! registered before the backend is shared. Classes are addressed by
//! [`ClassId`]; names resolve through canonical names, imports and the
//! implicit `java.lang.*`/`java.util.*` imports every session has.
//!
//! The registry doubles as the backend's type-description facility: it
//! implements [`TypeIntrospect`] over [`Value`].

use rustc_hash::FxHashMap;
use snip_bridge::{TypeIntrospect, Visibility};

use crate::value::Value;

/// Index of a class in its [`TypeRegistry`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ClassId(u32);

impl ClassId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Primitive {
    Int,
    Long,
    Double,
    Boolean,
}

impl Primitive {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "int" => Some(Primitive::Int),
            "long" => Some(Primitive::Long),
            "double" => Some(Primitive::Double),
            "boolean" => Some(Primitive::Boolean),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Double => "double",
            Primitive::Boolean => "boolean",
        }
    }
}

/// A type as used by declarations, casts and fields.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TypeRef {
    Primitive(Primitive),
    Class(ClassId),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ClassKind {
    Class,
    Interface,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub ty: TypeRef,
}

#[derive(Clone, Debug)]
pub struct ClassDef {
    pub simple_name: String,
    /// `None` for anonymous and local classes.
    pub canonical_name: Option<String>,
    pub visibility: Visibility,
    pub kind: ClassKind,
    pub parent: Option<ClassId>,
    pub interfaces: Vec<ClassId>,
    pub fields: Vec<FieldDef>,
    /// Whether `new C(...)` is allowed.
    pub constructible: bool,
}

impl ClassDef {
    /// Name used in diagnostics and object rendering.
    pub fn display_name(&self) -> &str {
        self.canonical_name.as_deref().unwrap_or(&self.simple_name)
    }

    pub fn package(&self) -> Option<&str> {
        let canonical = self.canonical_name.as_deref()?;
        canonical.rfind('.').map(|dot| &canonical[..dot])
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// Builtin classes the interpreter refers to directly.
#[derive(Copy, Clone, Debug)]
pub struct WellKnown {
    pub object: ClassId,
    pub string: ClassId,
    pub integer: ClassId,
    pub double: ClassId,
    pub boolean: ClassId,
    pub array_list: ClassId,
    pub throwable: ClassId,
    pub arithmetic: ClassId,
    pub null_pointer: ClassId,
    pub class_cast: ClassId,
    pub number_format: ClassId,
    pub index_out_of_bounds: ClassId,
    pub unsupported_operation: ClassId,
}

/// Imports in effect for one session.
#[derive(Clone, Debug, Default)]
pub struct Imports {
    single: FxHashMap<String, ClassId>,
    packages: Vec<String>,
}

impl Imports {
    pub fn add_single(&mut self, simple_name: impl Into<String>, class: ClassId) {
        self.single.insert(simple_name.into(), class);
    }

    pub fn add_package(&mut self, package: impl Into<String>) {
        let package = package.into();
        if !self.packages.contains(&package) {
            self.packages.push(package);
        }
    }
}

/// Why a type name cannot be used.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeError {
    NotFound { name: String },
    NotAccessible { name: String, visibility: Visibility },
}

impl std::fmt::Display for TypeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeError::NotFound { name } => {
                write!(f, "cannot find symbol\n  symbol:   class {name}")
            }
            TypeError::NotAccessible { name, visibility } => {
                let access = match visibility {
                    Visibility::Protected => "protected",
                    _ => "private",
                };
                write!(f, "{name} has {access} access")
            }
        }
    }
}

pub struct TypeRegistry {
    classes: Vec<ClassDef>,
    by_canonical: FxHashMap<String, ClassId>,
    /// Simple names visible without an import.
    implicit: FxHashMap<String, ClassId>,
    well_known: WellKnown,
}

impl TypeRegistry {
    /// Registry holding only the builtin classes.
    pub fn new() -> Self {
        let mut registry = TypeRegistry {
            classes: Vec::new(),
            by_canonical: FxHashMap::default(),
            implicit: FxHashMap::default(),
            well_known: WellKnown {
                object: ClassId(0),
                string: ClassId(0),
                integer: ClassId(0),
                double: ClassId(0),
                boolean: ClassId(0),
                array_list: ClassId(0),
                throwable: ClassId(0),
                arithmetic: ClassId(0),
                null_pointer: ClassId(0),
                class_cast: ClassId(0),
                number_format: ClassId(0),
                index_out_of_bounds: ClassId(0),
                unsupported_operation: ClassId(0),
            },
        };
        registry.install_builtins();
        registry
    }

    fn install_builtins(&mut self) {
        let object = self.builtin("java.lang.Object", ClassKind::Class, None, &[]);
        let char_sequence = self.builtin("java.lang.CharSequence", ClassKind::Interface, None, &[]);
        let comparable = self.builtin("java.lang.Comparable", ClassKind::Interface, None, &[]);
        let iterable = self.builtin("java.lang.Iterable", ClassKind::Interface, None, &[]);
        let collection =
            self.builtin("java.util.Collection", ClassKind::Interface, None, &[iterable]);
        let list = self.builtin("java.util.List", ClassKind::Interface, None, &[collection]);

        let number = self.builtin("java.lang.Number", ClassKind::Class, Some(object), &[]);
        let integer =
            self.builtin("java.lang.Integer", ClassKind::Class, Some(number), &[comparable]);
        let double = self.builtin("java.lang.Double", ClassKind::Class, Some(number), &[comparable]);
        let boolean =
            self.builtin("java.lang.Boolean", ClassKind::Class, Some(object), &[comparable]);
        let string = self.builtin(
            "java.lang.String",
            ClassKind::Class,
            Some(object),
            &[char_sequence, comparable],
        );
        let array_list = self.builtin("java.util.ArrayList", ClassKind::Class, Some(object), &[list]);
        self.classes[array_list.index()].constructible = true;

        let throwable = self.builtin("java.lang.Throwable", ClassKind::Class, Some(object), &[]);
        {
            let def = &mut self.classes[throwable.index()];
            def.constructible = true;
            def.fields.push(FieldDef {
                name: "message".to_string(),
                ty: TypeRef::Class(string),
            });
        }
        let exception = self.exception("java.lang.Exception", throwable);
        let runtime = self.exception("java.lang.RuntimeException", exception);
        let illegal_argument = self.exception("java.lang.IllegalArgumentException", runtime);
        self.exception("java.lang.IllegalStateException", runtime);
        let unsupported_operation =
            self.exception("java.lang.UnsupportedOperationException", runtime);
        let arithmetic = self.exception("java.lang.ArithmeticException", runtime);
        let null_pointer = self.exception("java.lang.NullPointerException", runtime);
        let class_cast = self.exception("java.lang.ClassCastException", runtime);
        let index_out_of_bounds = self.exception("java.lang.IndexOutOfBoundsException", runtime);
        let number_format = self.exception("java.lang.NumberFormatException", illegal_argument);

        self.well_known = WellKnown {
            object,
            string,
            integer,
            double,
            boolean,
            array_list,
            throwable,
            arithmetic,
            null_pointer,
            class_cast,
            number_format,
            index_out_of_bounds,
            unsupported_operation,
        };
    }

    fn builtin(
        &mut self,
        canonical: &str,
        kind: ClassKind,
        parent: Option<ClassId>,
        interfaces: &[ClassId],
    ) -> ClassId {
        let id = self.insert(ClassDef {
            simple_name: simple_name(canonical).to_string(),
            canonical_name: Some(canonical.to_string()),
            visibility: Visibility::Public,
            kind,
            parent,
            interfaces: interfaces.to_vec(),
            fields: Vec::new(),
            constructible: false,
        });
        self.implicit.insert(simple_name(canonical).to_string(), id);
        id
    }

    fn exception(&mut self, canonical: &str, parent: ClassId) -> ClassId {
        let id = self.builtin(canonical, ClassKind::Class, Some(parent), &[]);
        self.classes[id.index()].constructible = true;
        id
    }

    fn insert(&mut self, def: ClassDef) -> ClassId {
        let id = ClassId(u32::try_from(self.classes.len()).unwrap_or(u32::MAX));
        if let Some(canonical) = &def.canonical_name {
            self.by_canonical.insert(canonical.clone(), id);
        }
        self.classes.push(def);
        id
    }

    /// Start defining a public class named `canonical_name`, extending
    /// `java.lang.Object`.
    pub fn define_class(&mut self, canonical_name: &str) -> ClassBuilder<'_> {
        let parent = self.well_known.object;
        ClassBuilder::new(self, Some(canonical_name), ClassKind::Class, Some(parent))
    }

    /// Start defining a public interface named `canonical_name`.
    pub fn define_interface(&mut self, canonical_name: &str) -> ClassBuilder<'_> {
        ClassBuilder::new(self, Some(canonical_name), ClassKind::Interface, None)
    }

    /// Start defining a class without a canonical name, like an anonymous
    /// class. It can be instantiated by the host but never named in source.
    pub fn define_anonymous(&mut self, simple_name: &str) -> ClassBuilder<'_> {
        let parent = self.well_known.object;
        let mut builder = ClassBuilder::new(self, None, ClassKind::Class, Some(parent));
        builder.def.simple_name = simple_name.to_string();
        builder
    }

    pub fn well_known(&self) -> &WellKnown {
        &self.well_known
    }

    /// Panics on an id this registry did not issue; see [`TypeRegistry::get`].
    pub fn class(&self, id: ClassId) -> &ClassDef {
        &self.classes[id.index()]
    }

    /// `None` for an id from some other registry, as host objects may carry.
    pub fn get(&self, id: ClassId) -> Option<&ClassDef> {
        self.classes.get(id.index())
    }

    pub fn lookup(&self, canonical_name: &str) -> Option<ClassId> {
        self.by_canonical.get(canonical_name).copied()
    }

    /// Whether any class lives in `package`.
    pub fn has_package(&self, package: &str) -> bool {
        self.classes
            .iter()
            .any(|class| class.package() == Some(package))
    }

    /// Resolve a type name as written in source.
    ///
    /// Qualified names resolve by canonical name; simple names through
    /// single-type imports, then package imports, then implicit imports.
    pub fn resolve(&self, name: &str, imports: &Imports) -> Result<TypeRef, TypeError> {
        if let Some(primitive) = Primitive::from_name(name) {
            return Ok(TypeRef::Primitive(primitive));
        }
        let class = self
            .find_class(name, imports)
            .ok_or_else(|| TypeError::NotFound {
                name: name.to_string(),
            })?;
        let visibility = self.class(class).visibility;
        if matches!(visibility, Visibility::Private | Visibility::Protected) {
            return Err(TypeError::NotAccessible {
                name: name.to_string(),
                visibility,
            });
        }
        Ok(TypeRef::Class(class))
    }

    fn find_class(&self, name: &str, imports: &Imports) -> Option<ClassId> {
        if name.contains('.') {
            return self.lookup(name);
        }
        if let Some(&class) = imports.single.get(name) {
            return Some(class);
        }
        imports
            .packages
            .iter()
            .find_map(|package| self.lookup(&format!("{package}.{name}")))
            .or_else(|| self.implicit.get(name).copied())
    }

    /// Whether `sub` is `sup` or inherits from it through parents or
    /// interfaces.
    pub fn is_subclass(&self, sub: ClassId, sup: ClassId) -> bool {
        if sub == sup || sup == self.well_known.object {
            return true;
        }
        let Some(def) = self.get(sub) else {
            return false;
        };
        def.parent.is_some_and(|parent| self.is_subclass(parent, sup))
            || def
                .interfaces
                .iter()
                .any(|&interface| self.is_subclass(interface, sup))
    }

    pub fn is_throwable(&self, class: ClassId) -> bool {
        self.is_subclass(class, self.well_known.throwable)
    }

    /// All fields of `class`, inherited ones first.
    pub fn all_fields(&self, class: ClassId) -> Vec<FieldDef> {
        let Some(def) = self.get(class) else {
            return Vec::new();
        };
        let mut fields = def
            .parent
            .map_or_else(Vec::new, |parent| self.all_fields(parent));
        fields.extend(def.fields.iter().cloned());
        fields
    }

    pub fn type_name(&self, ty: TypeRef) -> &str {
        match ty {
            TypeRef::Primitive(primitive) => primitive.name(),
            TypeRef::Class(class) => self.class(class).display_name(),
        }
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("classes", &self.classes.len())
            .finish_non_exhaustive()
    }
}

impl TypeIntrospect for TypeRegistry {
    type Value = Value;
    type Type = ClassId;

    fn runtime_type(&self, value: &Value) -> Option<ClassId> {
        let known = &self.well_known;
        match value {
            Value::Null => None,
            Value::Int(_) => Some(known.integer),
            Value::Double(_) => Some(known.double),
            Value::Bool(_) => Some(known.boolean),
            Value::Str(_) => Some(known.string),
            Value::List(_) => Some(known.array_list),
            // Objects of classes this registry never defined have no
            // known type and are seen as the top type.
            Value::Object(object) => self.get(object.class()).map(|_| object.class()),
        }
    }

    fn canonical_name(&self, ty: ClassId) -> Option<&str> {
        self.get(ty)?.canonical_name.as_deref()
    }

    fn visibility(&self, ty: ClassId) -> Visibility {
        self.get(ty).map_or(Visibility::Private, |def| def.visibility)
    }

    fn interfaces(&self, ty: ClassId) -> &[ClassId] {
        self.get(ty).map_or(&[][..], |def| def.interfaces.as_slice())
    }

    fn parent(&self, ty: ClassId) -> Option<ClassId> {
        self.get(ty)?.parent
    }

    fn top_type_name(&self) -> &str {
        "java.lang.Object"
    }
}

/// Builder for a host class; see [`TypeRegistry::define_class`].
pub struct ClassBuilder<'r> {
    registry: &'r mut TypeRegistry,
    def: ClassDef,
}

impl<'r> ClassBuilder<'r> {
    fn new(
        registry: &'r mut TypeRegistry,
        canonical_name: Option<&str>,
        kind: ClassKind,
        parent: Option<ClassId>,
    ) -> Self {
        ClassBuilder {
            registry,
            def: ClassDef {
                simple_name: canonical_name.map(simple_name).unwrap_or_default().to_string(),
                canonical_name: canonical_name.map(str::to_string),
                visibility: Visibility::Public,
                kind,
                parent,
                interfaces: Vec::new(),
                fields: Vec::new(),
                constructible: kind == ClassKind::Class,
            },
        }
    }

    #[must_use]
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.def.visibility = visibility;
        self
    }

    #[must_use]
    pub fn extends(mut self, parent: ClassId) -> Self {
        self.def.parent = Some(parent);
        self
    }

    #[must_use]
    pub fn implements(mut self, interface: ClassId) -> Self {
        self.def.interfaces.push(interface);
        self
    }

    #[must_use]
    pub fn field(mut self, name: &str, ty: TypeRef) -> Self {
        self.def.fields.push(FieldDef {
            name: name.to_string(),
            ty,
        });
        self
    }

    #[must_use]
    pub fn constructible(mut self, constructible: bool) -> Self {
        self.def.constructible = constructible;
        self
    }

    pub fn build(self) -> ClassId {
        tracing::debug!(class = self.def.display_name(), "registered class");
        self.registry.insert(self.def)
    }
}

fn simple_name(canonical: &str) -> &str {
    canonical.rsplit('.').next().unwrap_or(canonical)
}
