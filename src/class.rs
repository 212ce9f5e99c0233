use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::callable::{BoundMethod, Callable, LoxFunction};
use crate::interpreter::{IResult, Interpreter};
use crate::value::Value;

/// Name of the method run by `ClassName(...)`.
pub const INITIALIZER: &str = "init";

pub type InstanceRef<'a> = Rc<RefCell<Instance<'a>>>;

/// Method table plus an optional single superclass.
pub struct LoxClass<'a> {
    name: &'a str,
    superclass: Option<Rc<LoxClass<'a>>>,
    methods: HashMap<&'a str, Rc<LoxFunction<'a>>>,
}

impl<'a> LoxClass<'a> {
    pub fn new(
        name: &'a str,
        superclass: Option<Rc<LoxClass<'a>>>,
        methods: HashMap<&'a str, Rc<LoxFunction<'a>>>,
    ) -> Self {
        Self {
            name,
            superclass,
            methods,
        }
    }

    pub fn name(&self) -> &'a str {
        self.name
    }

    /// Own table first, then up the superclass chain.
    pub fn find_method(&self, name: &str) -> Option<Rc<LoxFunction<'a>>> {
        if let Some(method) = self.methods.get(name) {
            return Some(Rc::clone(method));
        }

        self.superclass.as_ref()?.find_method(name)
    }

    /// The initializer's arity, or 0 without one.
    pub fn arity(&self) -> usize {
        self.find_method(INITIALIZER).map_or(0, |init| init.arity())
    }

    /// Allocate an instance and run `init` on it, if there is one.  The
    /// instance is the result regardless of what `init` returns.
    pub fn instantiate(
        class: &Rc<LoxClass<'a>>,
        interpreter: &mut Interpreter<'a>,
        arguments: Vec<Value<'a>>,
    ) -> IResult<'a, Value<'a>> {
        debug!("Instantiating class '{}'", class.name);

        let instance: InstanceRef<'a> = Rc::new(RefCell::new(Instance::new(Rc::clone(class))));

        if let Some(init) = class.find_method(INITIALIZER) {
            BoundMethod::new(Rc::clone(&instance), init).call(interpreter, arguments)?;
        }

        Ok(Value::Instance(instance))
    }
}

impl<'a> fmt::Debug for LoxClass<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<&&str> = self.methods.keys().collect();
        methods.sort_unstable();

        f.debug_struct("LoxClass")
            .field("name", &self.name)
            .field("superclass", &self.superclass.as_ref().map(|s| s.name))
            .field("methods", &methods)
            .finish()
    }
}

/// An object: its class plus per‑instance fields.
pub struct Instance<'a> {
    class: Rc<LoxClass<'a>>,
    fields: HashMap<&'a str, Value<'a>>,
}

impl<'a> Instance<'a> {
    pub fn new(class: Rc<LoxClass<'a>>) -> Self {
        Self {
            class,
            fields: HashMap::new(),
        }
    }

    pub fn class(&self) -> &Rc<LoxClass<'a>> {
        &self.class
    }

    pub fn field(&self, name: &str) -> Option<Value<'a>> {
        self.fields.get(name).cloned()
    }

    /// Writes always land in the field map, even when a method of the same
    /// name exists.
    pub fn set(&mut self, name: &'a str, value: Value<'a>) {
        self.fields.insert(name, value);
    }
}

/// Property read: a field wins over a method of the same name; a method is
/// returned bound to `instance`.  `None` if neither exists.
pub fn get_property<'a>(instance: &InstanceRef<'a>, name: &str) -> Option<Value<'a>> {
    if let Some(value) = instance.borrow().field(name) {
        return Some(value);
    }

    let method = instance.borrow().class().find_method(name)?;
    let bound = BoundMethod::new(Rc::clone(instance), method);

    Some(Value::Callable(Callable::BoundMethod(Rc::new(bound))))
}

// Fields may refer back to the instance itself.
impl<'a> fmt::Debug for Instance<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields: Vec<&&str> = self.fields.keys().collect();
        fields.sort_unstable();

        f.debug_struct("Instance")
            .field("class", &self.class.name)
            .field("fields", &fields)
            .finish()
    }
}
