//! Explicit-allocation object/array heap, with no garbage collector: a
//! handle stays valid until its owner calls `free_object`/`free_array`, or
//! forever if nobody does, matching the C interpreter's `malloc`/`free`
//! allocator this module is grounded on.
use std::collections::HashMap;

use crate::error::VmError;
use crate::frame::Slot;

pub type ObjectHandle = u32;
pub type ArrayHandle = u32;

/// A heap-allocated instance. Fields are untyped slots, offset by the
/// `GETFIELD`/`PUTFIELD` index (modulo the field count, matching the
/// interpreter's simplified field layout).
#[derive(Debug, Clone)]
pub struct Object {
    pub class_name: String,
    pub fields: Vec<Slot>,
}

/// A heap-allocated array of a single primitive/reference component type.
#[derive(Debug, Clone)]
pub struct Array {
    pub component_type: u8,
    pub data: Vec<Slot>,
}

/// Owns all live objects and arrays, keyed by handle. Handles are assigned
/// monotonically and never reused within a run.
#[derive(Debug, Default)]
pub struct Heap {
    objects: HashMap<ObjectHandle, Object>,
    arrays: HashMap<ArrayHandle, Array>,
    next_handle: u32,
}

/// Default field-slot count for objects allocated without a resolved field
/// layout, matching the interpreter's simplified `NEW` handling.
const DEFAULT_FIELD_COUNT: usize = 10;

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc_handle(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }

    pub fn new_object(&mut self, class_name: &str) -> ObjectHandle {
        let handle = self.alloc_handle();
        self.objects.insert(
            handle,
            Object { class_name: class_name.to_string(), fields: vec![0; DEFAULT_FIELD_COUNT] },
        );
        handle
    }

    pub fn new_array(&mut self, component_type: u8, length: i32) -> Result<ArrayHandle, VmError> {
        if length < 0 {
            return Err(VmError::NegativeArraySize(length));
        }
        let handle = self.alloc_handle();
        self.arrays.insert(handle, Array { component_type, data: vec![0; length as usize] });
        Ok(handle)
    }

    pub fn get_field(&self, handle: ObjectHandle, index: u16, pc: u32) -> Result<Slot, VmError> {
        let obj = self.objects.get(&handle).ok_or(VmError::NullPointer { pc })?;
        let offset = index as usize % obj.fields.len().max(1);
        Ok(obj.fields[offset])
    }

    pub fn put_field(
        &mut self,
        handle: ObjectHandle,
        index: u16,
        value: Slot,
        pc: u32,
    ) -> Result<(), VmError> {
        let obj = self.objects.get_mut(&handle).ok_or(VmError::NullPointer { pc })?;
        let offset = index as usize % obj.fields.len().max(1);
        obj.fields[offset] = value;
        Ok(())
    }

    pub fn array_length(&self, handle: ArrayHandle, pc: u32) -> Result<i32, VmError> {
        let arr = self.arrays.get(&handle).ok_or(VmError::NullPointer { pc })?;
        Ok(arr.data.len() as i32)
    }

    pub fn array_get(&self, handle: ArrayHandle, index: i32, pc: u32) -> Result<Slot, VmError> {
        let arr = self.arrays.get(&handle).ok_or(VmError::NullPointer { pc })?;
        arr.data.get(index as usize).copied().ok_or(VmError::NullPointer { pc })
    }

    pub fn array_set(
        &mut self,
        handle: ArrayHandle,
        index: i32,
        value: Slot,
        pc: u32,
    ) -> Result<(), VmError> {
        let arr = self.arrays.get_mut(&handle).ok_or(VmError::NullPointer { pc })?;
        let slot = arr.data.get_mut(index as usize).ok_or(VmError::NullPointer { pc })?;
        *slot = value;
        Ok(())
    }

    pub fn class_of(&self, handle: ObjectHandle) -> Option<&str> {
        self.objects.get(&handle).map(|o| o.class_name.as_str())
    }

    pub fn free_object(&mut self, handle: ObjectHandle) {
        self.objects.remove(&handle);
    }

    pub fn free_array(&mut self, handle: ArrayHandle) {
        self.arrays.remove(&handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_object_has_default_field_count() {
        let mut heap = Heap::new();
        let h = heap.new_object("Foo");
        assert_eq!(heap.get_field(h, 0, 0).unwrap(), 0);
        assert_eq!(heap.class_of(h), Some("Foo"));
    }

    #[test]
    fn put_then_get_field_round_trips() {
        let mut heap = Heap::new();
        let h = heap.new_object("Foo");
        heap.put_field(h, 3, 99, 0).unwrap();
        assert_eq!(heap.get_field(h, 3, 0).unwrap(), 99);
    }

    #[test]
    fn negative_array_size_is_rejected() {
        let mut heap = Heap::new();
        assert!(matches!(heap.new_array(0, -1), Err(VmError::NegativeArraySize(-1))));
    }

    #[test]
    fn field_access_on_freed_handle_is_null_pointer() {
        let mut heap = Heap::new();
        let h = heap.new_object("Foo");
        heap.free_object(h);
        assert!(matches!(heap.get_field(h, 0, 42), Err(VmError::NullPointer { pc: 42 })));
    }

    #[test]
    fn array_round_trips() {
        let mut heap = Heap::new();
        let h = heap.new_array(10, 4).unwrap();
        heap.array_set(h, 2, 7, 0).unwrap();
        assert_eq!(heap.array_get(h, 2, 0).unwrap(), 7);
        assert_eq!(heap.array_length(h, 0).unwrap(), 4);
    }
}
