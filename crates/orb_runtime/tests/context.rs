use std::sync::Arc;

use orb_runtime::{
    ContextTypeInfo, ObjectAttributes, ObjectKind, Runtime, RuntimeConfig, declare_context_type,
};

declare_context_type!(DEVICE_CONTEXT, "DeviceContext", 32);
declare_context_type!(QUEUE_CONTEXT, "QueueContext", 8);
declare_context_type!(EMPTY_CONTEXT, "EmptyContext", 0);
static DEVICE_LOOKALIKE: ContextTypeInfo = ContextTypeInfo::new("DeviceContext", 32);

#[test]
fn unattached_descriptor_is_not_found() {
    let rt = Runtime::new();
    let obj = rt.create_object(&ObjectAttributes::new(), 0, None).unwrap();
    assert!(obj.context(&DEVICE_CONTEXT).is_none());
}

#[test]
fn attached_block_is_zeroed_writable_and_sized() {
    let rt = Runtime::new();
    let obj = rt.create_object(&ObjectAttributes::new(), 0, None).unwrap();
    let block = obj.attach_context_with_size(&QUEUE_CONTEXT, 24).unwrap();
    assert_eq!(block.len(), 24);
    assert!(block.read(|b| b.iter().all(|x| *x == 0)));
    block.write(|b| b[..4].copy_from_slice(&7u32.to_le_bytes()));

    let found = obj.context(&QUEUE_CONTEXT).unwrap();
    assert!(Arc::ptr_eq(&block, &found));
    assert_eq!(found.read(|b| u32::from_le_bytes(b[..4].try_into().unwrap())), 7);
    assert!(found.type_info().is(&QUEUE_CONTEXT));
}

#[test]
fn creation_attributes_attach_the_descriptor() {
    let rt = Runtime::new();
    let lock = rt
        .create_wait_lock(&ObjectAttributes::new().with_context(&DEVICE_CONTEXT))
        .unwrap();
    assert_eq!(lock.kind(), ObjectKind::WaitLock);
    assert_eq!(lock.context(&DEVICE_CONTEXT).unwrap().len(), 32);
}

#[test]
fn zero_sized_descriptor_attaches_nothing() {
    let rt = Runtime::new();
    let obj = rt
        .create_object(&ObjectAttributes::new().with_context(&EMPTY_CONTEXT), 0, None)
        .unwrap();
    assert!(obj.context(&EMPTY_CONTEXT).is_none());
}

#[test]
fn lookup_is_by_identity() {
    let rt = Runtime::new();
    let obj = rt.create_object(&ObjectAttributes::new(), 0, None).unwrap();
    obj.attach_context(&DEVICE_CONTEXT).unwrap();
    assert!(obj.context(&DEVICE_LOOKALIKE).is_none());
}

#[test]
fn first_attached_block_wins() {
    let rt = Runtime::new();
    let obj = rt.create_object(&ObjectAttributes::new(), 0, None).unwrap();
    let first = obj.attach_context(&DEVICE_CONTEXT).unwrap();
    let second = obj.attach_context_with_size(&DEVICE_CONTEXT, 4).unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    let found = obj.context(&DEVICE_CONTEXT).unwrap();
    assert!(Arc::ptr_eq(&first, &found));
    assert_eq!(found.len(), 32);
}

#[test]
fn oversized_block_is_refused() {
    let rt = Runtime::with_config(RuntimeConfig {
        max_allocation: 16,
        ..RuntimeConfig::default()
    });
    let obj = rt.create_object(&ObjectAttributes::new(), 0, None).unwrap();
    let err = obj.attach_context(&DEVICE_CONTEXT).unwrap_err();
    assert!(err.is_resource_exhausted());
    assert!(obj.context(&DEVICE_CONTEXT).is_none());
}

#[test]
fn memory_objects_own_their_buffer() {
    let rt = Runtime::new();
    let parent = rt.create_object(&ObjectAttributes::new(), 0, None).unwrap();
    let mem = rt
        .create_memory(&ObjectAttributes::new().with_parent(&parent), 64)
        .unwrap();
    assert_eq!(mem.kind(), ObjectKind::Memory);
    assert_eq!(mem.len(), 64);
    assert!(!mem.is_preallocated());
    mem.buffer()[63] = 0xaa;
    assert_eq!(mem.buffer()[63], 0xaa);

    let adopted = rt
        .create_memory_preallocated(&ObjectAttributes::new(), vec![1, 2, 3].into_boxed_slice())
        .unwrap();
    assert!(adopted.is_preallocated());
    assert_eq!(&adopted.buffer()[..], &[1, 2, 3]);

    parent.delete();
    assert!(mem.is_destroyed());
    adopted.delete();
}

#[test]
fn locked_bytes_keep_their_length() {
    let rt = Runtime::new();
    let obj = rt.create_object(&ObjectAttributes::new(), 0, None).unwrap();
    let block = obj.attach_context(&QUEUE_CONTEXT).unwrap();
    {
        let mut bytes = block.lock();
        assert_eq!(bytes.len(), 8);
        bytes.fill(0x5a);
        bytes.reverse();
    }
    assert_eq!(block.len(), 8);
    assert!(block.read(|b| b.iter().all(|x| *x == 0x5a)));

    let mem = rt.create_memory(&ObjectAttributes::new(), 16).unwrap();
    {
        let mut buf = mem.buffer();
        buf.copy_from_slice(&[3; 16]);
        buf[..4].copy_from_slice(b"orb!");
    }
    assert_eq!(mem.len(), 16);
    assert_eq!(&mem.buffer()[..6], b"orb!\x03\x03");

    obj.delete();
    mem.delete();
}
