//! The dynamic object tree: the common currency between codecs.
//!
//! An [`Object`] is a handle into a node arena holding one tree of dynamic
//! values. Handles are cheap to clone and share the arena; [`ConstObject`]
//! is the read-only flavor of the same handle. Nodes are linked by integer
//! indices (`-1` = none) rather than owning pointers: handles are copied
//! freely, subtrees are spliced, and erased indices are recycled from a
//! free stack.
//!
//! Arenas are deliberately not `Send`: handles sharing one arena must stay
//! on one thread, while distinct arenas are fully independent.
//!
//! ## Tree shape
//!
//! - The root has no parent and an empty key.
//! - Children of a map carry unique, non-empty keys; insertion order is
//!   preserved.
//! - Children of a list carry empty keys; order is significant.
//! - Only map and list nodes may have children.

mod merge;
mod packer;

pub use merge::{diff, merge};
pub use packer::{read_object, write_object, ObjectReader, ObjectWriter};

use crate::error::{ErrorKind, PacktreeError, Result};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A dynamic value held by one tree node.
///
/// `Map` and `List` are markers; their contents live in child nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value. Equivalent to a missing key in the merge/diff algebra.
    Null,
    /// Boolean.
    Bool(bool),
    /// 64-bit signed integer; all integer kinds collapse to this.
    Int(i64),
    /// 64-bit float; both float kinds collapse to this.
    Float(f64),
    /// UTF-8 string.
    Str(String),
    /// Opaque bytes.
    Binary(Vec<u8>),
    /// Marker for a keyed container; children hold the entries.
    Map,
    /// Marker for an ordered container; children hold the elements.
    List,
}

impl Value {
    /// Whether this value kind may have children.
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Map | Self::List)
    }

    /// A short name for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Binary(_) => "binary",
            Self::Map => "map",
            Self::List => "list",
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Binary(v)
    }
}

/// Conversion out of a [`Value`], used by the typed accessors.
pub trait FromValue: Sized {
    /// Extracts `Self` when the value kind matches.
    fn from_value(value: &Value) -> Option<Self>;

    /// The kind this conversion expects, for error messages.
    fn kind_name() -> &'static str;
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    fn kind_name() -> &'static str {
        "int"
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    fn kind_name() -> &'static str {
        "float"
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    fn kind_name() -> &'static str {
        "bool"
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Str(v) => Some(v.clone()),
            _ => None,
        }
    }

    fn kind_name() -> &'static str {
        "string"
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Binary(v) => Some(v.clone()),
            _ => None,
        }
    }

    fn kind_name() -> &'static str {
        "binary"
    }
}

const NIL: i32 = -1;

#[derive(Debug, Clone)]
struct Node {
    value: Value,
    key: String,
    parent: i32,
    child: i32,
    prev: i32,
    next: i32,
}

impl Node {
    fn new(value: Value, key: String, parent: i32, prev: i32) -> Self {
        Self {
            value,
            key,
            parent,
            child: NIL,
            prev,
            next: NIL,
        }
    }
}

#[derive(Debug, Default)]
struct State {
    nodes: Vec<Node>,
    free: Vec<i32>,
}

impl State {
    fn alloc(&mut self, node: Node) -> i32 {
        match self.free.pop() {
            Some(index) => {
                self.nodes[index as usize] = node;
                index
            }
            None => {
                self.nodes.push(node);
                (self.nodes.len() - 1) as i32
            }
        }
    }

    /// Pushes every index of the subtree rooted at `index` onto the free
    /// stack. Links of freed nodes are left stale; the indices are dead
    /// until realloc.
    fn free_subtree(&mut self, index: i32) {
        let mut pending = vec![index];
        while let Some(current) = pending.pop() {
            let mut child = self.nodes[current as usize].child;
            while child != NIL {
                pending.push(child);
                child = self.nodes[child as usize].next;
            }
            self.free.push(current);
        }
    }

    fn last_child(&self, index: i32) -> i32 {
        let mut child = self.nodes[index as usize].child;
        if child == NIL {
            return NIL;
        }
        while self.nodes[child as usize].next != NIL {
            child = self.nodes[child as usize].next;
        }
        child
    }

    fn find_child(&self, index: i32, key: &str) -> i32 {
        let mut child = self.nodes[index as usize].child;
        while child != NIL {
            if self.nodes[child as usize].key == key {
                return child;
            }
            child = self.nodes[child as usize].next;
        }
        NIL
    }

    fn nth_child(&self, index: i32, position: usize) -> i32 {
        let mut child = self.nodes[index as usize].child;
        let mut remaining = position;
        while child != NIL && remaining > 0 {
            child = self.nodes[child as usize].next;
            remaining -= 1;
        }
        child
    }

    /// Appends a new child under `parent`, returning its index.
    fn attach(&mut self, parent: i32, key: String, value: Value) -> i32 {
        let prev = self.last_child(parent);
        let index = self.alloc(Node::new(value, key, parent, prev));
        if prev == NIL {
            self.nodes[parent as usize].child = index;
        } else {
            self.nodes[prev as usize].next = index;
        }
        index
    }
}

/// A mutable handle into an object tree.
///
/// Clones share the arena; deep copies go through [`Object::deep_clone`].
/// An invalid handle (failed lookup) is inert: navigation from it yields
/// more invalid handles and accessors yield `Null`.
#[derive(Clone)]
pub struct Object {
    state: Rc<RefCell<State>>,
    index: i32,
}

impl Object {
    /// Creates a fresh arena holding a single root node.
    pub fn new(value: impl Into<Value>) -> Object {
        let mut state = State::default();
        state.nodes.push(Node::new(value.into(), String::new(), NIL, NIL));
        Object {
            state: Rc::new(RefCell::new(state)),
            index: 0,
        }
    }

    fn handle(&self, index: i32) -> Object {
        Object {
            state: Rc::clone(&self.state),
            index,
        }
    }

    /// Whether this handle refers to a live node.
    pub fn is_valid(&self) -> bool {
        self.index != NIL
    }

    /// The root of the arena this handle belongs to.
    pub fn root(&self) -> Object {
        self.handle(0)
    }

    /// The parent node, or an invalid handle at the root.
    pub fn parent(&self) -> Object {
        self.link(|node| node.parent)
    }

    /// The first child, or an invalid handle.
    pub fn child(&self) -> Object {
        self.link(|node| node.child)
    }

    /// The previous sibling, or an invalid handle.
    pub fn prev(&self) -> Object {
        self.link(|node| node.prev)
    }

    /// The next sibling, or an invalid handle.
    pub fn next(&self) -> Object {
        self.link(|node| node.next)
    }

    fn link(&self, select: impl Fn(&Node) -> i32) -> Object {
        if !self.is_valid() {
            return self.handle(NIL);
        }
        let state = self.state.borrow();
        self.handle(select(&state.nodes[self.index as usize]))
    }

    /// The node's value. Invalid handles yield `Null`.
    pub fn value(&self) -> Value {
        if !self.is_valid() {
            return Value::Null;
        }
        self.state.borrow().nodes[self.index as usize].value.clone()
    }

    /// The node's key; empty for list children and the root.
    pub fn key(&self) -> String {
        if !self.is_valid() {
            return String::new();
        }
        self.state.borrow().nodes[self.index as usize].key.clone()
    }

    /// Typed access; fails with a kind-mismatch error when the value kind
    /// differs from `T`.
    pub fn get<T: FromValue>(&self) -> Result<T> {
        self.get_if::<T>().ok_or_else(|| {
            PacktreeError::Object(format!(
                "{}: expected {}, found {} at {}",
                ErrorKind::KindMismatch,
                T::kind_name(),
                self.value().kind_name(),
                self.display_path(),
            ))
        })
    }

    /// Typed access returning `None` instead of failing.
    pub fn get_if<T: FromValue>(&self) -> Option<T> {
        if !self.is_valid() {
            return None;
        }
        let state = self.state.borrow();
        T::from_value(&state.nodes[self.index as usize].value)
    }

    /// Map lookup by key; an invalid handle when missing or not a map.
    pub fn at(&self, key: &str) -> Object {
        if !self.is_valid() {
            return self.handle(NIL);
        }
        let state = self.state.borrow();
        self.handle(state.find_child(self.index, key))
    }

    /// List lookup by position; an invalid handle when out of range.
    pub fn at_index(&self, position: usize) -> Object {
        if !self.is_valid() {
            return self.handle(NIL);
        }
        let state = self.state.borrow();
        self.handle(state.nth_child(self.index, position))
    }

    /// Number of direct children for maps and lists, zero otherwise.
    pub fn size(&self) -> usize {
        if !self.is_valid() {
            return 0;
        }
        let state = self.state.borrow();
        let mut count = 0;
        let mut child = state.nodes[self.index as usize].child;
        while child != NIL {
            count += 1;
            child = state.nodes[child as usize].next;
        }
        count
    }

    /// Direct children, in order.
    pub fn children(&self) -> Vec<Object> {
        let mut out = Vec::new();
        let mut child = self.child();
        while child.is_valid() {
            out.push(child.clone());
            child = child.next();
        }
        out
    }

    /// Appends a keyed child under a map node.
    pub fn insert(&self, key: &str, value: impl Into<Value>) -> Result<Object> {
        if !self.is_valid() {
            return Err(PacktreeError::Object(format!(
                "{}: insert through an invalid handle",
                ErrorKind::NotAMap
            )));
        }
        let mut state = self.state.borrow_mut();
        if !matches!(state.nodes[self.index as usize].value, Value::Map) {
            return Err(PacktreeError::Object(format!(
                "{}: insert into {} at {}",
                ErrorKind::NotAMap,
                state.nodes[self.index as usize].value.kind_name(),
                path_of(&state, self.index),
            )));
        }
        if key.is_empty() {
            return Err(PacktreeError::Object(format!(
                "{}: empty map key at {}",
                ErrorKind::DuplicateKey,
                path_of(&state, self.index),
            )));
        }
        if state.find_child(self.index, key) != NIL {
            return Err(PacktreeError::Object(format!(
                "{}: {} at {}",
                ErrorKind::DuplicateKey,
                key,
                path_of(&state, self.index),
            )));
        }
        let index = state.attach(self.index, key.to_owned(), value.into());
        drop(state);
        Ok(self.handle(index))
    }

    /// Appends an unkeyed child under a list node.
    pub fn append(&self, value: impl Into<Value>) -> Result<Object> {
        if !self.is_valid() {
            return Err(PacktreeError::Object(format!(
                "{}: append through an invalid handle",
                ErrorKind::NotAList
            )));
        }
        let mut state = self.state.borrow_mut();
        if !matches!(state.nodes[self.index as usize].value, Value::List) {
            return Err(PacktreeError::Object(format!(
                "{}: append to {} at {}",
                ErrorKind::NotAList,
                state.nodes[self.index as usize].value.kind_name(),
                path_of(&state, self.index),
            )));
        }
        let index = state.attach(self.index, String::new(), value.into());
        drop(state);
        Ok(self.handle(index))
    }

    /// Replaces the value in place, preserving the node's identity.
    ///
    /// Children of the old value are freed unless the new value is the same
    /// container kind.
    pub fn set(&self, value: impl Into<Value>) {
        if !self.is_valid() {
            return;
        }
        let value = value.into();
        let mut state = self.state.borrow_mut();
        let same_kind = {
            let old = &state.nodes[self.index as usize].value;
            matches!(
                (old, &value),
                (Value::Map, Value::Map) | (Value::List, Value::List)
            )
        };
        if !same_kind {
            let mut child = state.nodes[self.index as usize].child;
            while child != NIL {
                let next = state.nodes[child as usize].next;
                state.free_subtree(child);
                child = next;
            }
            state.nodes[self.index as usize].child = NIL;
        }
        state.nodes[self.index as usize].value = value;
    }

    /// Unlinks this subtree, recycling its node indices.
    ///
    /// The handle dangles afterwards; using it is safe but yields stale
    /// data once the indices are reused.
    pub fn erase(&self) {
        if !self.is_valid() {
            return;
        }
        let mut state = self.state.borrow_mut();
        let (parent, prev, next) = {
            let node = &state.nodes[self.index as usize];
            (node.parent, node.prev, node.next)
        };
        if prev != NIL {
            state.nodes[prev as usize].next = next;
        } else if parent != NIL {
            state.nodes[parent as usize].child = next;
        }
        if next != NIL {
            state.nodes[next as usize].prev = prev;
        }
        state.free_subtree(self.index);
    }

    /// Erases all children of a map or list node.
    pub fn clear(&self) {
        if !self.is_valid() {
            return;
        }
        let mut state = self.state.borrow_mut();
        let mut child = state.nodes[self.index as usize].child;
        while child != NIL {
            let next = state.nodes[child as usize].next;
            state.free_subtree(child);
            child = next;
        }
        state.nodes[self.index as usize].child = NIL;
    }

    /// Deep-copies this subtree into a fresh arena.
    pub fn deep_clone(&self) -> Object {
        let target = Object::new(self.value());
        copy_children(&self.as_const(), &target);
        target
    }

    /// The read-only flavor of this handle, sharing the same arena.
    pub fn as_const(&self) -> ConstObject {
        ConstObject {
            inner: self.clone(),
        }
    }

    /// Dotted path from the root to this node, for error messages.
    pub fn display_path(&self) -> String {
        if !self.is_valid() {
            return "(invalid)".to_owned();
        }
        let state = self.state.borrow();
        path_of(&state, self.index)
    }
}

fn path_of(state: &State, index: i32) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut current = index;
    while current != NIL {
        let node = &state.nodes[current as usize];
        if node.parent == NIL {
            break;
        }
        let parent = &state.nodes[node.parent as usize];
        match parent.value {
            Value::List => {
                let mut position = 0;
                let mut sibling = parent.child;
                while sibling != NIL && sibling != current {
                    position += 1;
                    sibling = state.nodes[sibling as usize].next;
                }
                parts.push(format!("[{position}]"));
            }
            _ => parts.push(format!(".{}", node.key)),
        }
        current = node.parent;
    }
    if parts.is_empty() {
        return "(root)".to_owned();
    }
    let mut out = String::new();
    for part in parts.iter().rev() {
        out.push_str(part);
    }
    out.trim_start_matches('.').to_owned()
}

/// Copies the children of `src` under `dst`, recursively. `dst` must carry
/// the same container kind as `src` (or none).
fn copy_children(src: &ConstObject, dst: &Object) {
    for child in src.children() {
        let copied = match dst.value() {
            Value::Map => dst.insert(&child.key(), child.value()),
            Value::List => dst.append(child.value()),
            _ => continue,
        };
        // Kinds were copied verbatim, so the attach cannot fail.
        if let Ok(copied) = copied {
            copy_children(&child, &copied);
        }
    }
}

/// A read-only handle into an object tree, sharing the arena with the
/// [`Object`] handles it came from.
#[derive(Clone)]
pub struct ConstObject {
    inner: Object,
}

impl ConstObject {
    /// Whether this handle refers to a live node.
    pub fn is_valid(&self) -> bool {
        self.inner.is_valid()
    }

    /// The root of the arena this handle belongs to.
    pub fn root(&self) -> ConstObject {
        self.inner.root().as_const()
    }

    /// The parent node, or an invalid handle at the root.
    pub fn parent(&self) -> ConstObject {
        self.inner.parent().as_const()
    }

    /// The first child, or an invalid handle.
    pub fn child(&self) -> ConstObject {
        self.inner.child().as_const()
    }

    /// The previous sibling, or an invalid handle.
    pub fn prev(&self) -> ConstObject {
        self.inner.prev().as_const()
    }

    /// The next sibling, or an invalid handle.
    pub fn next(&self) -> ConstObject {
        self.inner.next().as_const()
    }

    /// The node's value. Invalid handles yield `Null`.
    pub fn value(&self) -> Value {
        self.inner.value()
    }

    /// The node's key; empty for list children and the root.
    pub fn key(&self) -> String {
        self.inner.key()
    }

    /// Typed access; fails with a kind-mismatch error on the wrong kind.
    pub fn get<T: FromValue>(&self) -> Result<T> {
        self.inner.get()
    }

    /// Typed access returning `None` instead of failing.
    pub fn get_if<T: FromValue>(&self) -> Option<T> {
        self.inner.get_if()
    }

    /// Map lookup by key; an invalid handle when missing or not a map.
    pub fn at(&self, key: &str) -> ConstObject {
        self.inner.at(key).as_const()
    }

    /// List lookup by position; an invalid handle when out of range.
    pub fn at_index(&self, position: usize) -> ConstObject {
        self.inner.at_index(position).as_const()
    }

    /// Number of direct children for maps and lists, zero otherwise.
    pub fn size(&self) -> usize {
        self.inner.size()
    }

    /// Direct children, in order.
    pub fn children(&self) -> Vec<ConstObject> {
        self.inner.children().into_iter().map(|c| c.as_const()).collect()
    }

    /// Deep-copies this subtree into a fresh arena.
    pub fn deep_clone(&self) -> Object {
        self.inner.deep_clone()
    }

    /// Dotted path from the root to this node, for error messages.
    pub fn display_path(&self) -> String {
        self.inner.display_path()
    }
}

impl From<Object> for ConstObject {
    fn from(object: Object) -> Self {
        object.as_const()
    }
}

/// Structural equality: scalars by value, lists positionally, maps by key
/// set (insertion order is preserved for traversal but not significant
/// for equality).
impl PartialEq for ConstObject {
    fn eq(&self, other: &Self) -> bool {
        structural_eq(self, other)
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        structural_eq(&self.as_const(), &other.as_const())
    }
}

fn structural_eq(a: &ConstObject, b: &ConstObject) -> bool {
    match (a.value(), b.value()) {
        (Value::Map, Value::Map) => {
            if a.size() != b.size() {
                return false;
            }
            for child in a.children() {
                let other = b.at(&child.key());
                if !other.is_valid() || !structural_eq(&child, &other) {
                    return false;
                }
            }
            true
        }
        (Value::List, Value::List) => {
            if a.size() != b.size() {
                return false;
            }
            a.children()
                .iter()
                .zip(b.children().iter())
                .all(|(x, y)| structural_eq(x, y))
        }
        (x, y) => x == y,
    }
}

fn render(node: &ConstObject, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
    let pad = "    ".repeat(indent);
    let key = node.key();
    let prefix = if key.is_empty() {
        String::new()
    } else {
        format!("{key}: ")
    };
    match node.value() {
        Value::Map => {
            writeln!(f, "{pad}{prefix}{{")?;
            for child in node.children() {
                render(&child, f, indent + 1)?;
            }
            writeln!(f, "{pad}}},")
        }
        Value::List => {
            writeln!(f, "{pad}{prefix}[")?;
            for child in node.children() {
                render(&child, f, indent + 1)?;
            }
            writeln!(f, "{pad}],")
        }
        Value::Null => writeln!(f, "{pad}{prefix}null,"),
        Value::Bool(v) => writeln!(f, "{pad}{prefix}{v},"),
        Value::Int(v) => writeln!(f, "{pad}{prefix}{v},"),
        Value::Float(v) => writeln!(f, "{pad}{prefix}{v},"),
        Value::Str(v) => writeln!(f, "{pad}{prefix}{v},"),
        Value::Binary(v) => writeln!(f, "{pad}{prefix}({} bytes),", v.len()),
    }
}

impl fmt::Display for ConstObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        render(self, f, 0)
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.as_const(), f)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object({})", self.display_path())
    }
}

impl fmt::Debug for ConstObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConstObject({})", self.inner.display_path())
    }
}
