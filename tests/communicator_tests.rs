use mesh_partition::algs::communicator::{
    CommTag, Communicator, NoComm, OutgoingMessage, PARTITION_TAG_BASE, ThreadComm,
};
use mesh_partition::algs::wire::ChunkInfo;

#[test]
fn thread_round_trip() {
    let tag = CommTag(0x1000);
    let world = ThreadComm::world(2);

    let msg = OutgoingMessage {
        peer: 1,
        tag,
        payload: b"hello".to_vec(),
    };
    world[0].exchange(&[msg], &[]).unwrap();
    let got = world[1].exchange(&[], &[(0, tag)]).unwrap();
    assert_eq!(got, vec![b"hello".to_vec()]);
}

#[test]
fn tags_keep_messages_apart() {
    let world = ThreadComm::world(2);
    let send = |tag: i32, byte: u8| OutgoingMessage {
        peer: 1,
        tag: CommTag(tag),
        payload: vec![byte],
    };
    world[0].exchange(&[send(1, 10), send(2, 20)], &[]).unwrap();
    let got = world[1]
        .exchange(&[], &[(0, CommTag(2)), (0, CommTag(1))])
        .unwrap();
    assert_eq!(got, vec![vec![20], vec![10]]);
}

#[test]
fn worlds_are_isolated() {
    let a = ThreadComm::world(2);
    let b = ThreadComm::world(2);
    let msg = OutgoingMessage {
        peer: 1,
        tag: CommTag(5),
        payload: vec![1],
    };
    b[0].exchange(&[msg.clone()], &[]).unwrap();
    a[0].exchange(
        &[OutgoingMessage {
            payload: vec![2],
            ..msg
        }],
        &[],
    )
    .unwrap();
    assert_eq!(a[1].exchange(&[], &[(0, CommTag(5))]).unwrap(), vec![vec![2]]);
    assert_eq!(b[1].exchange(&[], &[(0, CommTag(5))]).unwrap(), vec![vec![1]]);
}

#[test]
fn simultaneous_exchange_does_not_block() {
    let world = ThreadComm::world(2);
    let got: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = world
            .iter()
            .map(|c| {
                s.spawn(move || {
                    let peer = 1 - c.rank();
                    let payload = vec![c.rank() as u8; 1 << 16];
                    let out = OutgoingMessage {
                        peer,
                        tag: PARTITION_TAG_BASE,
                        payload,
                    };
                    c.exchange(&[out], &[(peer, PARTITION_TAG_BASE)]).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert!(got[0][0].iter().all(|&b| b == 1));
    assert!(got[1][0].iter().all(|&b| b == 0));
}

#[test]
fn chunk_info_gather_in_rank_order() {
    let world = ThreadComm::world(3);
    let counts = [2usize, 0, 1];
    let tables: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = world
            .iter()
            .map(|c| {
                s.spawn(move || {
                    let r = c.rank();
                    let local: Vec<ChunkInfo> = (0..counts[r])
                        .map(|i| ChunkInfo::new((r * 10 + i) as u64, -1, -1))
                        .collect();
                    c.all_gather_chunk_info(&local, &counts).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    let expected: Vec<u64> = vec![0, 1, 20];
    for table in tables {
        let elements: Vec<u64> = table.iter().map(|c| c.num_elements).collect();
        assert_eq!(elements, expected);
    }
}

#[test]
fn no_comm_has_no_peers() {
    let c = NoComm;
    assert_eq!((c.rank(), c.size()), (0, 1));
    assert_eq!(c.all_reduce_max_u64(3).unwrap(), 3);
    let msg = OutgoingMessage {
        peer: 1,
        tag: CommTag(1),
        payload: vec![],
    };
    assert!(c.exchange(&[msg], &[]).is_err());
}

#[test]
fn tag_offsets() {
    assert_eq!(PARTITION_TAG_BASE.base(), 12000);
    assert_eq!(PARTITION_TAG_BASE.offset(7), Some(CommTag(12007)));
    assert_eq!(CommTag::new(i32::MAX).offset(1), None);
    assert_eq!(PARTITION_TAG_BASE.offset(usize::MAX), None);
    assert_eq!(CommTag::new(3).base(), 3);
}
