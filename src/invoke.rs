//! Late-bound method calls against host objects.
//!
//! Host platforms expose different method sets across versions. Rather than
//! compiling against one, callers register what a host class offers in a
//! [`ClassRegistry`] and build calls by name with [`MethodBuilder`]. Overloads
//! are matched on the declared parameter types in order; nothing is reordered
//! or converted.

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::sync::Arc;

use log::{debug, error};

use crate::error::{Result, VastError};
use crate::render::DisplaySurface;

/// A dynamically typed argument or return value
pub type Value = Box<dyn Any + Send>;

type InstanceBody = Arc<dyn Fn(&mut dyn Any, Vec<Value>) -> Result<Value> + Send + Sync>;
type StaticBody = Arc<dyn Fn(Vec<Value>) -> Result<Value> + Send + Sync>;

/// The declared type of a parameter
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ParamType {
    id: Option<TypeId>,
    name: &'static str,
}

impl ParamType {
    /// Accepts an argument of any declared type
    pub const ANY: ParamType = ParamType { id: None, name: "any" };

    pub fn of<T: Any>() -> Self {
        Self { id: Some(TypeId::of::<T>()), name: type_name::<T>() }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn accepts(&self, declared: &ParamType) -> bool {
        self.id.is_none() || self.id == declared.id
    }
}

impl fmt::Debug for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

enum MethodBody {
    Instance(InstanceBody),
    Static(StaticBody),
}

/// A named method with an ordered parameter list
pub struct MethodDef {
    name: String,
    params: Vec<ParamType>,
    public: bool,
    body: MethodBody,
}

impl MethodDef {
    pub fn instance<F>(name: impl Into<String>, params: Vec<ParamType>, body: F) -> Self
    where
        F: Fn(&mut dyn Any, Vec<Value>) -> Result<Value> + Send + Sync + 'static,
    {
        Self { name: name.into(), params, public: true, body: MethodBody::Instance(Arc::new(body)) }
    }

    pub fn class_method<F>(name: impl Into<String>, params: Vec<ParamType>, body: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value> + Send + Sync + 'static,
    {
        Self { name: name.into(), params, public: true, body: MethodBody::Static(Arc::new(body)) }
    }

    /// Hide the method from callers that did not ask for accessibility
    pub fn private(mut self) -> Self {
        self.public = false;
        self
    }

    fn matches(&self, declared: &[ParamType]) -> bool {
        self.params.len() == declared.len()
            && self.params.iter().zip(declared).all(|(param, declared)| param.accepts(declared))
    }
}

struct ConstructorDef {
    params: Vec<ParamType>,
    body: StaticBody,
}

/// What the registry knows about one host class
pub struct ClassDef {
    name: String,
    instance_type: Option<TypeId>,
    methods: Vec<MethodDef>,
    constructors: Vec<ConstructorDef>,
}

impl ClassDef {
    /// A class with no instances of its own, only class methods and constructors
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), instance_type: None, methods: Vec::new(), constructors: Vec::new() }
    }

    /// A class whose instances are values of `T`
    pub fn for_type<T: Any>(name: impl Into<String>) -> Self {
        Self { instance_type: Some(TypeId::of::<T>()), ..Self::new(name) }
    }

    pub fn method(mut self, method: MethodDef) -> Self {
        self.methods.push(method);
        self
    }

    pub fn constructor<F>(mut self, params: Vec<ParamType>, body: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value> + Send + Sync + 'static,
    {
        self.constructors.push(ConstructorDef { params, body: Arc::new(body) });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether any overload of `name` exists
    pub fn declares(&self, name: &str) -> bool {
        self.methods.iter().any(|m| m.name == name)
    }
}

/// Registered host classes. Build one per host and pass it where calls are made.
#[derive(Default)]
pub struct ClassRegistry {
    classes: Vec<ClassDef>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, class: ClassDef) -> &mut Self {
        self.classes.push(class);
        self
    }

    pub fn class(&self, name: &str) -> Option<&ClassDef> {
        self.classes.iter().find(|c| c.name == name)
    }

    pub fn class_of(&self, instance: &dyn Any) -> Option<&ClassDef> {
        let type_id = <dyn Any as Any>::type_id(instance);
        self.classes.iter().find(|c| c.instance_type == Some(type_id))
    }
}

/// Builds and executes a single call
pub struct MethodBuilder<'a> {
    registry: &'a ClassRegistry,
    instance: Option<&'a mut dyn Any>,
    method_name: String,
    static_class: Option<String>,
    accessible: bool,
    params: Vec<(ParamType, Value)>,
}

impl<'a> MethodBuilder<'a> {
    pub fn new(registry: &'a ClassRegistry, instance: Option<&'a mut dyn Any>, method_name: impl Into<String>) -> Self {
        Self {
            registry,
            instance,
            method_name: method_name.into(),
            static_class: None,
            accessible: false,
            params: Vec::new(),
        }
    }

    /// Append an argument declared as its own type
    pub fn add_param<T: Any + Send>(self, value: T) -> Self {
        self.add_param_as(ParamType::of::<T>(), value)
    }

    /// Append an argument declared as `param_type`
    pub fn add_param_as<T: Any + Send>(mut self, param_type: ParamType, value: T) -> Self {
        self.params.push((param_type, Box::new(value)));
        self
    }

    /// Call a class method of `class_name` instead of a method on the instance
    pub fn set_static(mut self, class_name: impl Into<String>) -> Self {
        self.static_class = Some(class_name.into());
        self
    }

    /// Allow calling private methods
    pub fn set_accessible(mut self) -> Self {
        self.accessible = true;
        self
    }

    pub fn execute(self) -> Result<Value> {
        let registry = self.registry;
        let class = match (&self.static_class, &self.instance) {
            (Some(class_name), _) => registry
                .class(class_name)
                .ok_or_else(|| VastError::ClassNotFound(class_name.clone()))?,
            (None, Some(instance)) => registry
                .class_of(&**instance)
                .ok_or_else(|| VastError::ClassNotFound(format!("instance of {}", self.method_name)))?,
            (None, None) => return Err(VastError::NullTarget(self.method_name)),
        };

        let qualified = format!("{}.{}", class.name, self.method_name);
        if !class.declares(&self.method_name) {
            return Err(VastError::NoSuchMethod(qualified));
        }

        let declared: Vec<ParamType> = self.params.iter().map(|(param_type, _)| *param_type).collect();
        let method = class
            .methods
            .iter()
            .find(|m| m.name == self.method_name && m.matches(&declared))
            .ok_or_else(|| VastError::ParameterMismatch {
                method: qualified.clone(),
                params: describe(&declared),
            })?;

        if !method.public && !self.accessible {
            return Err(VastError::InaccessibleMethod(qualified));
        }

        debug!("Invoking {}({})", qualified, describe(&declared));
        let args = self.params.into_iter().map(|(_, value)| value).collect();
        match &method.body {
            MethodBody::Static(body) => body(args),
            MethodBody::Instance(body) => match self.instance {
                Some(instance) => body(instance, args),
                None => Err(VastError::NullTarget(qualified)),
            },
        }
    }
}

/// Construct an instance of `class_name` and downcast it to `T`
pub fn instantiate_with_constructor<T: Any>(
    registry: &ClassRegistry,
    class_name: &str,
    params: Vec<(ParamType, Value)>,
) -> Result<T> {
    let class = registry
        .class(class_name)
        .ok_or_else(|| VastError::ClassNotFound(class_name.to_string()))?;

    let declared: Vec<ParamType> = params.iter().map(|(param_type, _)| *param_type).collect();
    let constructor = class
        .constructors
        .iter()
        .find(|c| c.params.len() == declared.len() && c.params.iter().zip(&declared).all(|(p, d)| p.accepts(d)))
        .ok_or_else(|| VastError::ParameterMismatch {
            method: format!("{}::new", class_name),
            params: describe(&declared),
        })?;

    let value = (constructor.body)(params.into_iter().map(|(_, value)| value).collect())?;
    value.downcast::<T>().map(|boxed| *boxed).map_err(|_| VastError::ClassCast {
        class: class_name.to_string(),
        target: type_name::<T>().to_string(),
    })
}

/// Downcast an argument or return value
pub fn take<T: Any>(value: Value) -> Result<T> {
    value.downcast::<T>().map(|boxed| *boxed).map_err(|_| VastError::ClassCast {
        class: "value".to_string(),
        target: type_name::<T>().to_string(),
    })
}

/// Pair a value with its own type, for constructor calls
pub fn param<T: Any + Send>(value: T) -> (ParamType, Value) {
    (ParamType::of::<T>(), Box::new(value))
}

/// Pop the next argument inside a method body and downcast it
pub fn next_arg<T: Any>(args: &mut impl Iterator<Item = Value>) -> Result<T> {
    let value = args
        .next()
        .ok_or_else(|| VastError::Other(format!("missing {} argument", type_name::<T>())))?;
    take(value)
}

fn describe(params: &[ParamType]) -> String {
    params.iter().map(|p| p.name).collect::<Vec<_>>().join(", ")
}

pub const LOAD_DATA: &str = "load_data";
pub const LOAD_DATA_WITH_BASE_URL: &str = "load_data_with_base_url";

/// A display surface backed by a registered host object.
///
/// Uses `load_data_with_base_url(Option<String>, String)` when the host class
/// declares it and `load_data(String)` otherwise.
pub struct ReflectiveSurface<'a> {
    registry: &'a ClassRegistry,
    host: &'a mut dyn Any,
    base_url: Option<String>,
}

impl<'a> ReflectiveSurface<'a> {
    pub fn new(registry: &'a ClassRegistry, host: &'a mut dyn Any) -> Self {
        Self { registry, host, base_url: None }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    fn try_load(&mut self, markup: &str) -> Result<()> {
        let class = self
            .registry
            .class_of(&*self.host)
            .ok_or_else(|| VastError::ClassNotFound("display surface host".to_string()))?;

        let builder = if class.declares(LOAD_DATA_WITH_BASE_URL) {
            MethodBuilder::new(self.registry, Some(&mut *self.host), LOAD_DATA_WITH_BASE_URL)
                .add_param(self.base_url.clone())
                .add_param(markup.to_string())
        } else {
            MethodBuilder::new(self.registry, Some(&mut *self.host), LOAD_DATA).add_param(markup.to_string())
        };
        builder.execute().map(|_| ())
    }
}

impl DisplaySurface for ReflectiveSurface<'_> {
    fn load_markup(&mut self, markup: &str) -> Result<()> {
        self.try_load(markup).map_err(|e| {
            error!("Failed to load markup into host surface: {}", e);
            e
        })
    }
}
