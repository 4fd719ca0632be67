// Lock-free communication channels
//
// Three bounded SPSC rings connect the control surface, the audio thread
// and the observer:
//   commands:  control → audio   (configuration and transport changes)
//   events:    audio   → observer (trigger notifications)
//   reclaim:   audio   → control  (replaced heap values, freed off-thread)

use ringbuf::{HeapRb, traits::Split};

use crate::messaging::command::{Command, Reclaimed};
use crate::messaging::event::TriggerEvent;

pub type CommandProducer = ringbuf::HeapProd<Command>;
pub type CommandConsumer = ringbuf::HeapCons<Command>;

pub fn create_command_channel(capacity: usize) -> (CommandProducer, CommandConsumer) {
    let rb = HeapRb::<Command>::new(capacity);
    rb.split()
}

pub type EventProducer = ringbuf::HeapProd<TriggerEvent>;
pub type EventConsumer = ringbuf::HeapCons<TriggerEvent>;

pub fn create_event_channel(capacity: usize) -> (EventProducer, EventConsumer) {
    let rb = HeapRb::<TriggerEvent>::new(capacity);
    rb.split()
}

pub type ReclaimProducer = ringbuf::HeapProd<Reclaimed>;
pub type ReclaimConsumer = ringbuf::HeapCons<Reclaimed>;

pub fn create_reclaim_channel(capacity: usize) -> (ReclaimProducer, ReclaimConsumer) {
    let rb = HeapRb::<Reclaimed>::new(capacity);
    rb.split()
}
