// Stress test for EventLog concurrent append
use outbreak_duel::event_log::{EventLog, EventPayload};
use std::sync::Arc;
use std::thread;

#[test]
fn event_log_stress_append() {
    let log = Arc::new(EventLog::new());
    let threads = 16usize;
    let per_thread = 1000usize;
    let mut handles = Vec::new();
    for i in 0..threads {
        let log_clone = Arc::clone(&log);
        handles.push(thread::spawn(move || {
            for j in 0..per_thread {
                let payload = EventPayload::CardDrawn {
                    game_id: 1,
                    equipe_id: format!("t{}_{}", i, j),
                    card_code: "NUM_1".to_string(),
                };
                log_clone.append("CardDrawn", payload);
            }
        }));
    }
    for h in handles {
        h.join().expect("thread panicked");
    }
    let entries = log.entries();
    assert_eq!(entries.len(), threads * per_thread);
    let mut seqs: Vec<u64> = entries.iter().map(|e| e.seq).collect();
    seqs.sort();
    for (idx, seq) in seqs.iter().enumerate() {
        assert_eq!(*seq as usize, idx + 1);
    }
}
