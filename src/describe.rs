//! Introspection tables: what a module declares.
//!
//! Rust has no runtime reflection, so every fixture type registers a [`TypeDescriptor`] (normally generated by
//! `#[rigor::fixture]`, see [`Describe`]). A [`Module`] is the arena of descriptors a test binary exposes; base types
//! are linked by arena index and resolved by walking [`Module::base_of`].
//!
//! Methods are invoked through type-erased closures. Instance methods receive the fixture instance as
//! `&mut dyn Any` and downcast it to their declaring type; a mismatch is a `RuntimeError` failure, never a panic.

use std::any::Any;
use std::fmt;

use rigor_core::lang::kinds::{self, FailureKind};
use rigor_core::lang::tags::TagId;

use crate::failure::{Failure, capture};

/// What a test body returns.
pub type TestResult = Result<(), Failure>;

/// A constructed fixture instance.
pub type Instance = Box<dyn Any>;

/// One step from a derived instance to its base part.
pub type Upcast = fn(&mut dyn Any) -> Option<&mut dyn Any>;

type Constructor = Box<dyn Fn() -> Result<Instance, Failure>>;

// ============================================================================
// Methods
// ============================================================================

/// Whether a method needs an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receiver {
    Static,
    Instance,
}

enum Invoker {
    Static(Box<dyn Fn() -> TestResult>),
    Instance(Box<dyn Fn(&mut dyn Any) -> TestResult>),
    /// Methods with parameters are described but never callable.
    Unbound,
}

/// Payload of the `expected_error` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedError {
    pub kind: FailureKind,
    /// Substring the raised message must contain.
    pub message: Option<String>,
}

impl fmt::Display for ExpectedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(m) => write!(f, "{} containing [{m}]", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// A metadata tag attached to a method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tag {
    TestCase,
    SetUp,
    TearDown,
    OneTimeSetUp,
    OneTimeTearDown,
    ExpectedError(ExpectedError),
}

impl Tag {
    pub fn id(&self) -> TagId {
        match self {
            Tag::TestCase => TagId::TestCase,
            Tag::SetUp => TagId::SetUp,
            Tag::TearDown => TagId::TearDown,
            Tag::OneTimeSetUp => TagId::OneTimeSetUp,
            Tag::OneTimeTearDown => TagId::OneTimeTearDown,
            Tag::ExpectedError(_) => TagId::ExpectedError,
        }
    }
}

/// One declared method of a fixture type.
pub struct MethodDescriptor {
    declaring_type: String,
    name: String,
    param_count: usize,
    receiver: Receiver,
    tags: Vec<Tag>,
    invoker: Invoker,
}

impl MethodDescriptor {
    fn with_invoker(name: impl Into<String>, receiver: Receiver, param_count: usize, invoker: Invoker) -> Self {
        Self {
            declaring_type: String::new(),
            name: name.into(),
            param_count,
            receiver,
            tags: Vec::new(),
            invoker,
        }
    }

    /// A static (associated) zero-parameter function.
    pub fn function(name: impl Into<String>, f: impl Fn() -> TestResult + 'static) -> Self {
        Self::with_invoker(name, Receiver::Static, 0, Invoker::Static(Box::new(f)))
    }

    /// A zero-parameter method taking `&self` or `&mut self` on `T`.
    pub fn instance<T: Any>(name: impl Into<String>, f: impl Fn(&mut T) -> TestResult + 'static) -> Self {
        let invoke = move |any: &mut dyn Any| match any.downcast_mut::<T>() {
            Some(this) => f(this),
            None => Err(Failure::bare(
                &kinds::RUNTIME_ERROR,
                format!("instance is not a {}", std::any::type_name::<T>()),
            )),
        };
        Self::with_invoker(name, Receiver::Instance, 0, Invoker::Instance(Box::new(invoke)))
    }

    /// A method with parameters. It is visible to discovery but never qualifies for a role.
    pub fn uninvokable(name: impl Into<String>, receiver: Receiver, param_count: usize) -> Self {
        Self::with_invoker(name, receiver, param_count, Invoker::Unbound)
    }

    pub fn tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn expect_error(self, kind: FailureKind, message: Option<&str>) -> Self {
        self.tag(Tag::ExpectedError(ExpectedError {
            kind,
            message: message.map(str::to_string),
        }))
    }

    pub fn declaring_type(&self) -> &str {
        &self.declaring_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `Type.method`, the name used in events and reports.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.declaring_type, self.name)
    }

    pub fn param_count(&self) -> usize {
        self.param_count
    }

    pub fn receiver(&self) -> Receiver {
        self.receiver
    }

    pub fn is_static(&self) -> bool {
        self.receiver == Receiver::Static
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn has_tag(&self, id: TagId) -> bool {
        self.tags.iter().any(|t| t.id() == id)
    }

    pub fn expected_error(&self) -> Option<&ExpectedError> {
        self.tags.iter().find_map(|t| match t {
            Tag::ExpectedError(spec) => Some(spec),
            _ => None,
        })
    }

    /// Call the method. Static methods ignore `instance`.
    ///
    /// Panics inside the body are not caught here; callers wrap this in [`capture`].
    pub fn invoke(&self, instance: Option<&mut dyn Any>) -> TestResult {
        match (&self.invoker, instance) {
            (Invoker::Static(f), _) => f(),
            (Invoker::Instance(f), Some(this)) => f(this),
            (Invoker::Instance(_), None) => Err(Failure::bare(
                &kinds::RUNTIME_ERROR,
                format!("instance method {} invoked without an instance", self.qualified_name()),
            )),
            (Invoker::Unbound, _) => Err(Failure::bare(
                &kinds::RUNTIME_ERROR,
                format!("{} takes {} parameter(s) and cannot be invoked", self.qualified_name(), self.param_count),
            )),
        }
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.qualified_name())
            .field("param_count", &self.param_count)
            .field("receiver", &self.receiver)
            .field("tags", &self.tags)
            .finish()
    }
}

// ============================================================================
// Types
// ============================================================================

struct BaseLink {
    name: String,
    upcast: Upcast,
    describe: Option<fn() -> TypeDescriptor>,
}

/// One registered type: its tags, constructor, base link and declared methods.
pub struct TypeDescriptor {
    name: String,
    test_class: bool,
    constructor: Option<Constructor>,
    base: Option<BaseLink>,
    methods: Vec<MethodDescriptor>,
}

impl TypeDescriptor {
    /// A `test_class` type with no constructor, base or methods yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            test_class: true,
            constructor: None,
            base: None,
            methods: Vec::new(),
        }
    }

    /// Drop the `test_class` tag: the type only serves as a base for other fixtures.
    pub fn support(mut self) -> Self {
        self.test_class = false;
        self
    }

    pub fn constructor(mut self, f: impl Fn() -> Result<Instance, Failure> + 'static) -> Self {
        self.constructor = Some(Box::new(f));
        self
    }

    pub fn constructed_by<T: Any>(self, make: impl Fn() -> T + 'static) -> Self {
        self.constructor(move || Ok(Box::new(make()) as Instance))
    }

    pub fn default_constructor<T: Any + Default>(self) -> Self {
        self.constructed_by(T::default)
    }

    /// Link the registered base type `B`.
    pub fn base<B: Describe>(mut self, upcast: Upcast) -> Self {
        self.base = Some(BaseLink {
            name: B::TYPE_NAME.to_string(),
            upcast,
            describe: Some(B::descriptor),
        });
        self
    }

    /// Link a base type by name. The base must be registered in the same module.
    pub fn base_named(mut self, name: impl Into<String>, upcast: Upcast) -> Self {
        self.base = Some(BaseLink {
            name: name.into(),
            upcast,
            describe: None,
        });
        self
    }

    pub fn method(mut self, mut method: MethodDescriptor) -> Self {
        method.declaring_type = self.name.clone();
        self.methods.push(method);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_test_class(&self) -> bool {
        self.test_class
    }

    pub fn has_constructor(&self) -> bool {
        self.constructor.is_some()
    }

    /// Declared methods in declaration order (base methods are not included).
    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }

    pub fn base_name(&self) -> Option<&str> {
        self.base.as_ref().map(|b| b.name.as_str())
    }

    pub fn upcast(&self) -> Option<Upcast> {
        self.base.as_ref().map(|b| b.upcast)
    }

    /// Create an instance. A panicking constructor yields its failure.
    pub fn construct(&self) -> Result<Instance, Failure> {
        match &self.constructor {
            Some(make) => capture(make)?,
            None => Err(Failure::bare(
                &kinds::RUNTIME_ERROR,
                format!("{} has no zero-argument constructor", self.name),
            )),
        }
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("test_class", &self.test_class)
            .field("constructor", &self.constructor.is_some())
            .field("base", &self.base_name())
            .field("methods", &self.methods)
            .finish()
    }
}

/// Implemented by `#[rigor::fixture]` for every registered type.
pub trait Describe: Any {
    const TYPE_NAME: &'static str;

    fn descriptor() -> TypeDescriptor;
}

/// Conversion from a test method's return value into a [`TestResult`].
pub trait IntoTestResult {
    fn into_test_result(self) -> TestResult;
}

impl IntoTestResult for () {
    fn into_test_result(self) -> TestResult {
        Ok(())
    }
}

impl<E: Into<Failure>> IntoTestResult for Result<(), E> {
    fn into_test_result(self) -> TestResult {
        self.map_err(Into::into)
    }
}

// ============================================================================
// Modules
// ============================================================================

/// Index of a type in a [`Module`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeIdx(usize);

struct ModuleEntry {
    descriptor: TypeDescriptor,
    base: Option<TypeIdx>,
    exported: bool,
}

/// A loaded unit: an arena of type descriptors with resolved base links.
pub struct Module {
    name: String,
    entries: Vec<ModuleEntry>,
}

impl Module {
    pub fn builder(name: impl Into<String>) -> ModuleBuilder {
        ModuleBuilder {
            name: name.into(),
            descriptors: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Exported types in registration order.
    pub fn exported(&self) -> impl Iterator<Item = TypeIdx> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.exported)
            .map(|(i, _)| TypeIdx(i))
    }

    pub fn get(&self, idx: TypeIdx) -> &TypeDescriptor {
        &self.entries[idx.0].descriptor
    }

    pub fn base_of(&self, idx: TypeIdx) -> Option<TypeIdx> {
        self.entries[idx.0].base
    }

    pub fn find(&self, name: &str) -> Option<TypeIdx> {
        self.entries
            .iter()
            .position(|e| e.descriptor.name == name)
            .map(TypeIdx)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("types", &self.entries.iter().map(|e| &e.descriptor.name).collect::<Vec<_>>())
            .finish()
    }
}

/// Collects registrations and resolves base links into a [`Module`].
pub struct ModuleBuilder {
    name: String,
    descriptors: Vec<TypeDescriptor>,
}

impl ModuleBuilder {
    pub fn register<T: Describe>(self) -> Self {
        self.descriptor(T::descriptor())
    }

    pub fn descriptor(mut self, descriptor: TypeDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    /// Resolve bases. Base types reachable only through a base link are added as non-exported entries.
    pub fn build(self) -> Module {
        let mut entries: Vec<ModuleEntry> = self
            .descriptors
            .into_iter()
            .map(|descriptor| ModuleEntry {
                descriptor,
                base: None,
                exported: true,
            })
            .collect();

        let mut i = 0;
        while i < entries.len() {
            let missing = entries[i].descriptor.base.as_ref().and_then(|link| {
                let known = entries.iter().any(|e| e.descriptor.name == link.name);
                if known { None } else { link.describe }
            });
            if let Some(describe) = missing {
                entries.push(ModuleEntry {
                    descriptor: describe(),
                    base: None,
                    exported: false,
                });
            }
            i += 1;
        }

        for i in 0..entries.len() {
            let Some(base_name) = entries[i].descriptor.base_name() else { continue };
            let resolved = entries.iter().position(|e| e.descriptor.name == base_name);
            if resolved.is_none() {
                tracing::warn!(
                    module = %self.name,
                    ty = %entries[i].descriptor.name,
                    base = %base_name,
                    "base type is not registered; base methods are unavailable"
                );
            }
            entries[i].base = resolved.map(TypeIdx);
        }

        Module {
            name: self.name,
            entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Base {
        hits: u32,
    }

    #[derive(Default)]
    struct Derived {
        base: Base,
    }

    impl Describe for Base {
        const TYPE_NAME: &'static str = "Base";

        fn descriptor() -> TypeDescriptor {
            TypeDescriptor::new("Base")
                .support()
                .default_constructor::<Base>()
                .method(
                    MethodDescriptor::instance::<Base>("bump", |b: &mut Base| {
                        b.hits += 1;
                        Ok(())
                    })
                    .tag(Tag::SetUp),
                )
        }
    }

    fn upcast(any: &mut dyn Any) -> Option<&mut dyn Any> {
        any.downcast_mut::<Derived>().map(|d| &mut d.base as &mut dyn Any)
    }

    fn derived() -> TypeDescriptor {
        TypeDescriptor::new("Derived")
            .default_constructor::<Derived>()
            .base::<Base>(upcast)
            .method(MethodDescriptor::function("case", || Ok(())).tag(Tag::TestCase))
    }

    #[test]
    fn build_pulls_in_unregistered_bases() {
        let module = Module::builder("m").descriptor(derived()).build();
        assert_eq!(module.len(), 2);

        let exported: Vec<_> = module.exported().collect();
        assert_eq!(exported.len(), 1);
        let base = module.base_of(exported[0]).unwrap();
        assert_eq!(module.get(base).name(), "Base");
        assert!(!module.get(base).is_test_class());
    }

    #[test]
    fn build_reuses_registered_bases() {
        let module = Module::builder("m").register::<Base>().descriptor(derived()).build();
        assert_eq!(module.len(), 2);
        assert_eq!(module.exported().count(), 2);
        assert_eq!(module.base_of(TypeIdx(1)), Some(TypeIdx(0)));
    }

    #[test]
    fn methods_record_their_declaring_type() {
        let ty = derived();
        assert_eq!(ty.methods()[0].qualified_name(), "Derived.case");
        assert!(ty.methods()[0].has_tag(TagId::TestCase));
        assert!(ty.methods()[0].is_static());
    }

    #[test]
    fn instance_invocation_downcasts() {
        let ty = Base::descriptor();
        let mut instance = ty.construct().unwrap();
        ty.methods()[0].invoke(Some(instance.as_mut())).unwrap();
        assert_eq!(instance.downcast_ref::<Base>().unwrap().hits, 1);

        let mut wrong: Instance = Box::new(7_u8);
        let err = ty.methods()[0].invoke(Some(wrong.as_mut())).unwrap_err();
        assert_eq!(err.kind(), &kinds::RUNTIME_ERROR);

        let err = ty.methods()[0].invoke(None).unwrap_err();
        assert_eq!(err.kind(), &kinds::RUNTIME_ERROR);
    }

    #[test]
    fn construct_without_constructor_fails() {
        let ty = TypeDescriptor::new("Bare");
        assert!(!ty.has_constructor());
        assert!(ty.construct().is_err());
    }

    #[test]
    fn panicking_constructor_is_captured() {
        let ty = TypeDescriptor::new("Boom").constructed_by::<u8>(|| panic!("ValueError: no"));
        let err = ty.construct().unwrap_err();
        assert_eq!(err.kind(), &kinds::VALUE_ERROR);
    }

    #[test]
    fn expected_error_payload_is_exposed() {
        let m = MethodDescriptor::function("f", || Ok(()))
            .tag(Tag::TestCase)
            .expect_error(&kinds::KEY_ERROR, Some("missing"));
        let spec = m.expected_error().unwrap();
        assert_eq!(spec.kind, &kinds::KEY_ERROR);
        assert_eq!(spec.message.as_deref(), Some("missing"));
        assert_eq!(spec.to_string(), "KeyError containing [missing]");
    }

    #[test]
    fn uninvokable_methods_report_their_arity() {
        let m = MethodDescriptor::uninvokable("takes_two", Receiver::Instance, 2);
        assert_eq!(m.param_count(), 2);
        assert!(m.invoke(None).is_err());
    }
}
