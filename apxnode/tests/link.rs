use apxnode::config::Config;
use apxnode::core::{NodeLayout, PortInfo, PortSpan};
use apxnode::delivery::{Push, WriteQueue};
use apxnode::handler::{FnHandler, PortDispatch};
use apxnode::link;
use apxnode::port::{ProvidePort, RequirePort};
use apxnode::storage::Storage;
use apxnode::NodeData;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use futures_executor::LocalPool;
use futures_task::LocalSpawn;
use std::boxed::Box;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

const REQUIRE: &[PortInfo] = &[
    PortInfo::new("SoundRequest", 0, 3),
    PortInfo::new("U8ARPort", 3, 3),
    PortInfo::new("U8Port", 6, 1),
];
const PROVIDE: &[PortInfo] = &[
    PortInfo::new("U16ARPort", 0, 8),
    PortInfo::new("U32Port", 8, 4),
];
const LAYOUT: NodeLayout<'static> = NodeLayout::new(REQUIRE, PROVIDE);

const U8_AR_PORT: RequirePort<[u8; 3]> = RequirePort::new(3);
const PAIR_PORT: ProvidePort<(u16, u16)> = ProvidePort::new(8);
const U16_AR_PORT: ProvidePort<[u16; 4]> = ProvidePort::new(0);
const U32_PORT: ProvidePort<u32> = ProvidePort::new(8);

type Node<'a> = NodeData<'a, CriticalSectionRawMutex>;
type Queue = WriteQueue<CriticalSectionRawMutex, 2>;

fn init_storage() -> Storage<7, 12> {
    Storage::new([0xff; 7], [0xff; 12])
}

#[test]
fn test_queue_delivery() {
    let queue = Queue::new();
    let mut storage = init_storage();
    let (input, output) = storage.split();
    let config = Config::default().with_delivery(&queue);
    let node = Node::new("TestNode", &[], LAYOUT, input, output, config).unwrap();
    let (_rx, mut tx) = node.link().split();
    tx.open();

    U16_AR_PORT.write(&node, &[1, 2, 3, 4]).unwrap();
    U32_PORT.write(&node, &5).unwrap();
    U16_AR_PORT.write(&node, &[6, 7, 8, 9]).unwrap();
    assert_eq!(queue.len(), 2);

    let mut buf = [0u8; 8];
    while let Some(span) = queue.try_pop() {
        let dst = &mut buf[..span.len as usize];
        tx.consume(span.offset, dst).unwrap();
    }
    assert_eq!(buf[..4], [5, 0, 0, 0]);
    assert_eq!(tx.is_dirty(0), Ok(false));
    assert_eq!(tx.is_dirty(8), Ok(false));

    U32_PORT.write(&node, &6).unwrap();
    assert_eq!(queue.try_pop(), Some(PortSpan::new(8, 4)));
}

#[test]
fn test_reopen_drops_queued_commands() {
    let queue = Queue::new();
    let mut storage = init_storage();
    let (input, output) = storage.split();
    let config = Config::default().with_delivery(&queue).with_out_open(true);
    let node = Node::new("TestNode", &[], LAYOUT, input, output, config).unwrap();
    let (_rx, mut tx) = node.link().split();

    U16_AR_PORT.write(&node, &[1, 2, 3, 4]).unwrap();
    U32_PORT.write(&node, &5).unwrap();
    assert_eq!(queue.len(), 2);

    tx.close();
    assert_eq!(queue.len(), 2);
    tx.open();
    assert!(queue.is_empty());

    U16_AR_PORT.write(&node, &[6, 7, 8, 9]).unwrap();
    U32_PORT.write(&node, &10).unwrap();

    assert_eq!(queue.try_pop(), Some(PortSpan::new(0, 8)));
    assert_eq!(queue.try_pop(), Some(PortSpan::new(8, 4)));
    assert_eq!(queue.try_pop(), None);
}

#[test]
fn test_push_and_queue_delivery() {
    let queue = Queue::new();
    let pushed = AtomicUsize::new(0);
    let push = Push(|_: PortSpan| {
        pushed.fetch_add(1, Ordering::Relaxed);
    });
    let sink = (&push, &queue);

    let mut storage = init_storage();
    let (input, output) = storage.split();
    let config = Config::default().with_delivery(&sink).with_out_open(true);
    let node = Node::new("TestNode", &[], LAYOUT, input, output, config).unwrap();

    U32_PORT.write(&node, &1).unwrap();
    assert_eq!(pushed.load(Ordering::Relaxed), 1);
    assert_eq!(queue.try_pop(), Some(PortSpan::new(8, 4)));
}

#[test]
fn test_async_transport() {
    let mut executor = LocalPool::new();
    let spawner = executor.spawner();

    let (node, queue) = {
        let queue: &'static Queue = Box::leak(Box::new(Queue::new()));
        let storage = Box::leak(Box::new(init_storage()));
        let (input, output) = storage.split();
        let config = Config::default().with_delivery(queue);
        let node = Node::new("TestNode", &[], LAYOUT, input, output, config).unwrap();
        let node: &'static Node<'static> = Box::leak(Box::new(node));
        (node, queue)
    };
    let (_rx, tx) = node.link().split();

    let received = Box::leak(Box::new(AtomicBool::new(false)));

    spawner
        .spawn_local_obj(Box::new(test_async_send(tx, queue, received)).into())
        .unwrap();

    executor.run_until_stalled();
    assert!(!received.load(Ordering::SeqCst));

    U32_PORT.write(node, &0x0403_0201).unwrap();
    executor.run_until_stalled();
    assert!(received.load(Ordering::SeqCst));
}

async fn test_async_send(mut tx: link::Tx<'static>, queue: &'static Queue, complete: &'static AtomicBool) {
    tx.open();

    let span = queue.pop().await;
    assert_eq!(span, PortSpan::new(8, 4));

    let mut bytes = [0u8; 4];
    tx.consume(span.offset, &mut bytes).unwrap();
    assert_eq!(bytes, [1, 2, 3, 4]);

    complete.store(true, Ordering::SeqCst);
}

#[test]
fn test_blocking_pop() {
    let queue = Queue::new();
    let mut storage = init_storage();
    let (input, output) = storage.split();
    let config = Config::default().with_delivery(&queue).with_out_open(true);
    let node = Node::new("TestNode", &[], LAYOUT, input, output, config).unwrap();

    U16_AR_PORT.write(&node, &[1, 2, 3, 4]).unwrap();
    assert_eq!(
        futures_executor::block_on(queue.pop()),
        PortSpan::new(0, 8)
    );
}

#[test]
fn test_port_dispatch() {
    let seen = Mutex::new(Vec::new());
    let dispatch = PortDispatch::new(LAYOUT, |port: &PortInfo, bytes: &[u8]| {
        seen.lock().unwrap().push((port.name, bytes.to_vec()));
    });

    let mut storage = init_storage();
    let (input, output) = storage.split();
    let config = Config::default().with_handler(&dispatch);
    let node = Node::new("TestNode", &[], LAYOUT, input, output, config).unwrap();
    let (mut rx, _tx) = node.link().split();

    rx.write(2, &[0x10, 1, 2], false).unwrap();
    rx.write(6, &[7], false).unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        [
            ("SoundRequest", vec![0xff, 0xff, 0x10]),
            ("U8ARPort", vec![1, 2, 0xff]),
            ("U8Port", vec![7]),
        ]
    );
}

#[test]
fn test_fragmented_write() {
    let spans = Mutex::new(Vec::new());
    let handler = FnHandler(|_: &[u8], span: PortSpan| spans.lock().unwrap().push(span));

    let mut storage = init_storage();
    let (input, output) = storage.split();
    let config = Config::default().with_handler(&handler);
    let node = Node::new("TestNode", &[], LAYOUT, input, output, config).unwrap();
    let (mut rx, _tx) = node.link().split();

    rx.write(0, &[1, 2, 3, 4], true).unwrap();
    rx.write(4, &[5, 6, 7], false).unwrap();

    assert_eq!(*spans.lock().unwrap(), [PortSpan::new(0, 7)]);
    assert_eq!(U8_AR_PORT.read(&node), Ok([4, 5, 6]));
    assert_eq!(U8_AR_PORT.take_update(&node), Ok(true));

    rx.write(6, &[8], false).unwrap();
    assert_eq!(
        *spans.lock().unwrap(),
        [PortSpan::new(0, 7), PortSpan::new(6, 1)]
    );
}

#[test]
fn test_fragmented_write_dispatches_every_port() {
    let seen = Mutex::new(Vec::new());
    let dispatch = PortDispatch::new(LAYOUT, |port: &PortInfo, bytes: &[u8]| {
        seen.lock().unwrap().push((port.name, bytes.to_vec()));
    });

    let mut storage = init_storage();
    let (input, output) = storage.split();
    let config = Config::default().with_handler(&dispatch);
    let node = Node::new("TestNode", &[], LAYOUT, input, output, config).unwrap();
    let (mut rx, _tx) = node.link().split();

    rx.write(0, &[1, 2, 3, 4], true).unwrap();
    assert!(seen.lock().unwrap().is_empty());
    rx.write(4, &[5, 6, 7], false).unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        [
            ("SoundRequest", vec![1, 2, 3]),
            ("U8ARPort", vec![4, 5, 6]),
            ("U8Port", vec![7]),
        ]
    );
}

#[test]
fn test_concurrent_read_is_never_torn() {
    let mut storage = init_storage();
    let (input, output) = storage.split();
    let node = Node::new("TestNode", &[], LAYOUT, input, output, Config::default()).unwrap();
    let (mut rx, tx) = node.link().split();
    let done = AtomicBool::new(false);

    std::thread::scope(|s| {
        s.spawn(|| {
            for n in 0..=u8::MAX {
                rx.write(3, &[n, n, n], false).unwrap();
                PAIR_PORT.write(&node, &(u16::from(n), u16::from(n))).unwrap();
            }
            done.store(true, Ordering::SeqCst);
        });

        s.spawn(|| {
            let mut bytes = [0u8; 4];
            while !done.load(Ordering::SeqCst) {
                let [a, b, c] = U8_AR_PORT.read(&node).unwrap();
                assert!(a == b && b == c);

                tx.read(8, &mut bytes).unwrap();
                assert_eq!(bytes[..2], bytes[2..]);
            }
        });
    });

    assert_eq!(U8_AR_PORT.read(&node), Ok([0xff; 3]));
    assert_eq!(PAIR_PORT.read(&node), Ok((0xff, 0xff)));
}
