//! End-to-end dispatch, lifecycle, delayed-response and notification tests
//! driving the runtime through mock modules over the software arch.

use std::sync::{Arc, Mutex};

use modfwk::{
    EntityId, Event, EventSender, FwkError, FwkResult, IdKind, LightEvent, Module, ModuleConfig,
    ModuleDesc, ModuleKind, Runtime, RuntimeConfig, SoftArch,
};

use core::any::Any;
use modfwk::ElementDesc;

type SeenLog = Arc<Mutex<Vec<Event>>>;

fn new_runtime(pool: usize) -> (Runtime, Arc<SoftArch>) {
    let arch = Arc::new(SoftArch::new());
    let rt = Runtime::new(
        arch.clone(),
        RuntimeConfig::new()
            .with_event_capacity(pool)
            .with_arena_capacity(8 * 1024),
    );
    (rt, arch)
}

/// Records everything it is asked to process; decrements its outstanding
/// counter for each notification response it receives.
struct Recorder {
    seen: SeenLog,
    outstanding: Arc<Mutex<i32>>,
}

impl Recorder {
    fn new(seen: SeenLog, outstanding: Arc<Mutex<i32>>) -> Self {
        Self { seen, outstanding }
    }
}

impl Module for Recorder {
    fn init(
        &mut self,
        _fwk: &mut Runtime,
        _module_id: EntityId,
        _element_count: usize,
        _data: Option<&(dyn Any + Send + Sync)>,
    ) -> FwkResult {
        Ok(())
    }

    fn process_event(
        &mut self,
        _fwk: &mut Runtime,
        event: &Event,
        _response: &mut Event,
    ) -> FwkResult {
        self.seen.lock().unwrap().push(event.clone());
        Ok(())
    }

    fn process_notification(
        &mut self,
        _fwk: &mut Runtime,
        event: &Event,
        _response: &mut Event,
    ) -> FwkResult {
        self.seen.lock().unwrap().push(event.clone());
        if event.is_response {
            *self.outstanding.lock().unwrap() -= 1;
        }
        Ok(())
    }
}

/// Answers requests. Immediate mode reverses the request params (or writes
/// a marker when the request had none); delayed mode parks the response and
/// records the cookie needed to complete it.
struct Responder {
    delayed: bool,
    seen: SeenLog,
    recorded_cookie: Arc<Mutex<Option<u32>>>,
}

impl Module for Responder {
    fn init(
        &mut self,
        _fwk: &mut Runtime,
        _module_id: EntityId,
        _element_count: usize,
        _data: Option<&(dyn Any + Send + Sync)>,
    ) -> FwkResult {
        Ok(())
    }

    fn process_event(
        &mut self,
        _fwk: &mut Runtime,
        event: &Event,
        response: &mut Event,
    ) -> FwkResult {
        self.seen.lock().unwrap().push(event.clone());
        if self.delayed {
            response.is_delayed_response = true;
            *self.recorded_cookie.lock().unwrap() = Some(event.cookie);
            return Err(FwkError::Pending);
        }
        if event.params.is_empty() {
            response.set_params(&[0xAB])?;
        } else {
            let reversed: Vec<u8> = event.params.iter().rev().copied().collect();
            response.set_params(&reversed)?;
        }
        Ok(())
    }
}

fn recorder_responder_pair(pool: usize, delayed: bool) -> (Runtime, SeenLog, SeenLog, Arc<Mutex<Option<u32>>>) {
    let (mut rt, _arch) = new_runtime(pool);
    let m0_seen: SeenLog = Arc::default();
    let m1_seen: SeenLog = Arc::default();
    let cookie = Arc::new(Mutex::new(None));

    rt.add_module(
        ModuleDesc::new("requester", ModuleKind::Service).with_event_count(2),
        ModuleConfig::new().with_elements(vec![ElementDesc::new("r0")]),
        Box::new(Recorder::new(m0_seen.clone(), Arc::default())),
    )
    .unwrap();
    rt.add_module(
        ModuleDesc::new("responder", ModuleKind::Driver).with_event_count(1),
        ModuleConfig::new().with_elements(vec![ElementDesc::new("d0")]),
        Box::new(Responder {
            delayed,
            seen: m1_seen.clone(),
            recorded_cookie: cookie.clone(),
        }),
    )
    .unwrap();
    rt.start().unwrap();
    (rt, m0_seen, m1_seen, cookie)
}

fn request(params: &[u8]) -> Event {
    Event::new(
        EntityId::event(1, 0),
        EntityId::element(0, 0),
        EntityId::element(1, 0),
    )
    .with_response_requested()
    .with_params(params)
}

#[test]
fn test_simple_event_response() {
    let (mut rt, m0_seen, m1_seen, _) = recorder_responder_pair(8, false);
    assert_eq!(rt.free_count(), 8);

    let mut ev = request(&[1, 2, 3, 4]);
    rt.put_event(&mut ev).unwrap();
    let cookie = ev.cookie;
    assert_ne!(cookie, 0);
    assert_eq!(rt.free_count(), 7);

    rt.process_event_queue();

    let m1 = m1_seen.lock().unwrap();
    assert_eq!(m1.len(), 1);
    assert_eq!(m1[0].params.as_slice(), &[1, 2, 3, 4]);
    assert!(m1[0].response_requested);

    let m0 = m0_seen.lock().unwrap();
    assert_eq!(m0.len(), 1);
    let response = &m0[0];
    assert_eq!(response.id, EntityId::event(1, 0));
    assert_eq!(response.source_id, EntityId::element(1, 0));
    assert_eq!(response.target_id, EntityId::element(0, 0));
    assert!(response.is_response);
    assert!(!response.response_requested);
    assert_eq!(response.params.as_slice(), &[4, 3, 2, 1]);
    assert_eq!(response.cookie, cookie);

    // Both descriptors consumed and recycled.
    assert_eq!(rt.free_count(), 8);
    assert_eq!(rt.stats().processed, 2);
    assert_eq!(rt.stats().responses, 1);
}

#[test]
fn test_round_trip_preserves_each_cookie() {
    let (mut rt, m0_seen, _, _) = recorder_responder_pair(8, false);

    let mut cookies = Vec::new();
    for i in 0..3u8 {
        let mut ev = request(&[i]);
        rt.put_event(&mut ev).unwrap();
        cookies.push(ev.cookie);
    }
    rt.process_event_queue();

    let m0 = m0_seen.lock().unwrap();
    assert_eq!(m0.len(), 3);
    for (response, cookie) in m0.iter().zip(&cookies) {
        assert!(response.is_response);
        assert_eq!(response.cookie, *cookie);
    }
    // Cookies are strictly monotonic.
    assert!(cookies.windows(2).all(|w| w[1] > w[0]));
    assert_eq!(rt.free_count(), 8);
}

#[test]
fn test_delayed_response() {
    let (mut rt, m0_seen, m1_seen, recorded) = recorder_responder_pair(8, true);

    let mut ev = request(&[1, 2, 3, 4]);
    rt.put_event(&mut ev).unwrap();
    rt.process_event_queue();

    // The target deferred: no response yet, one descriptor parked.
    assert_eq!(m1_seen.lock().unwrap().len(), 1);
    assert!(m0_seen.lock().unwrap().is_empty());
    assert_eq!(rt.delayed_count(EntityId::element(1, 0)).unwrap(), 1);
    assert_eq!(rt.free_count(), 7);

    let cookie = recorded.lock().unwrap().take().unwrap();
    assert_eq!(cookie, ev.cookie);

    // Driver completes with fresh params and the recorded cookie.
    let mut done = Event::new(
        EntityId::event(1, 0),
        EntityId::element(1, 0),
        EntityId::element(0, 0),
    );
    done.is_response = true;
    done.is_delayed_response = true;
    done.cookie = cookie;
    done.set_params(&[9, 9]).unwrap();
    rt.put_event(&mut done).unwrap();

    assert_eq!(rt.delayed_count(EntityId::element(1, 0)).unwrap(), 0);
    rt.process_event_queue();

    let m0 = m0_seen.lock().unwrap();
    assert_eq!(m0.len(), 1);
    // Params come from the completion, not the original scratch.
    assert_eq!(m0[0].params.as_slice(), &[9, 9]);
    assert_eq!(m0[0].cookie, cookie);
    assert!(m0[0].is_response);
    assert_eq!(rt.free_count(), 8);
}

#[test]
fn test_delayed_completion_with_wrong_cookie_fails() {
    let (mut rt, _, _, recorded) = recorder_responder_pair(8, true);

    let mut ev = request(&[1]);
    rt.put_event(&mut ev).unwrap();
    rt.process_event_queue();
    assert!(recorded.lock().unwrap().is_some());

    let mut done = Event::new(
        EntityId::event(1, 0),
        EntityId::element(1, 0),
        EntityId::element(0, 0),
    );
    done.is_response = true;
    done.is_delayed_response = true;
    done.cookie = 0xDEAD;
    assert_eq!(rt.put_event(&mut done), Err(FwkError::Param));
    // The parked descriptor is untouched.
    assert_eq!(rt.delayed_count(EntityId::element(1, 0)).unwrap(), 1);
}

#[test]
fn test_release_delayed_response() {
    let (mut rt, m0_seen, _, recorded) = recorder_responder_pair(8, true);

    let mut ev = request(&[7, 7]);
    rt.put_event(&mut ev).unwrap();
    rt.process_event_queue();

    let cookie = recorded.lock().unwrap().take().unwrap();
    let parked = rt
        .release_delayed_response(EntityId::element(1, 0), cookie)
        .unwrap();
    assert_eq!(parked.cookie, cookie);
    assert_eq!(parked.target_id, EntityId::element(0, 0));
    assert!(parked.is_delayed_response);

    // Released, not enqueued: nothing further reaches the requester.
    rt.process_event_queue();
    assert!(m0_seen.lock().unwrap().is_empty());
    assert_eq!(rt.delayed_count(EntityId::element(1, 0)).unwrap(), 0);
    assert_eq!(rt.free_count(), 8);
}

#[test]
fn test_light_event_response_carries_params() {
    let (mut rt, m0_seen, _, _) = recorder_responder_pair(8, false);

    let mut light = LightEvent::new(
        EntityId::event(1, 0),
        EntityId::element(0, 0),
        EntityId::element(1, 0),
    );
    light.response_requested = true;
    rt.put_event_light(&mut light).unwrap();
    rt.process_event_queue();

    let m0 = m0_seen.lock().unwrap();
    assert_eq!(m0.len(), 1);
    // The request could not carry params; the response can.
    assert_eq!(m0[0].params.as_slice(), &[0xAB]);
    assert_ne!(m0[0].cookie, 0);
}

#[test]
fn test_fifo_within_runnable_queue() {
    let (mut rt, _, m1_seen, _) = recorder_responder_pair(8, false);

    for i in 0..4u8 {
        let mut ev = Event::new(
            EntityId::event(1, 0),
            EntityId::element(0, 0),
            EntityId::element(1, 0),
        )
        .with_params(&[i]);
        rt.put_event(&mut ev).unwrap();
    }
    rt.process_event_queue();

    let m1 = m1_seen.lock().unwrap();
    let order: Vec<u8> = m1.iter().map(|e| e.params[0]).collect();
    assert_eq!(order, [0, 1, 2, 3]);
}

/// Posts a follow-up event through the interrupt-side sender from inside
/// its own handler, checking that the in-flight dispatch is unaffected.
struct IsrEcho {
    sender: Arc<Mutex<Option<EventSender>>>,
    seen: SeenLog,
    posted: bool,
}

impl Module for IsrEcho {
    fn init(
        &mut self,
        _fwk: &mut Runtime,
        _module_id: EntityId,
        _element_count: usize,
        _data: Option<&(dyn Any + Send + Sync)>,
    ) -> FwkResult {
        Ok(())
    }

    fn start(&mut self, fwk: &mut Runtime, id: EntityId) -> FwkResult {
        if id.is_kind(IdKind::Module) {
            *self.sender.lock().unwrap() = Some(fwk.sender()?);
        }
        Ok(())
    }

    fn process_event(
        &mut self,
        fwk: &mut Runtime,
        event: &Event,
        _response: &mut Event,
    ) -> FwkResult {
        self.seen.lock().unwrap().push(event.clone());
        if !self.posted {
            self.posted = true;
            let sender = self.sender.lock().unwrap().clone().ok_or(FwkError::State)?;
            let mut follow_up = Event::new(
                EntityId::event(0, 1),
                EntityId::module(0),
                EntityId::element(0, 0),
            );
            sender.put_event(&mut follow_up)?;
            // The interrupt-side post does not disturb the event being
            // handled.
            assert_eq!(
                fwk.current_event().map(|e| e.cookie),
                Some(event.cookie)
            );
        }
        Ok(())
    }
}

#[test]
fn test_isr_posting_during_dispatch() {
    let (mut rt, _arch) = new_runtime(8);
    let seen: SeenLog = Arc::default();

    rt.add_module(
        ModuleDesc::new("echo", ModuleKind::Service).with_event_count(2),
        ModuleConfig::new().with_elements(vec![ElementDesc::new("e0")]),
        Box::new(IsrEcho {
            sender: Arc::default(),
            seen: seen.clone(),
            posted: false,
        }),
    )
    .unwrap();
    rt.start().unwrap();

    let mut trigger = Event::new(
        EntityId::event(0, 0),
        EntityId::module(0),
        EntityId::element(0, 0),
    );
    rt.put_event(&mut trigger).unwrap();
    rt.process_event_queue();

    // Both the trigger and the interrupt-posted follow-up were dispatched,
    // in that order, via one isr drain.
    let log = seen.lock().unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].id, EntityId::event(0, 0));
    assert_eq!(log[1].id, EntityId::event(0, 1));
    assert_eq!(rt.stats().isr_drained, 1);
    assert_eq!(rt.isr_count(), 0);
    assert_eq!(rt.free_count(), 8);
}

#[test]
fn test_put_event_from_simulated_interrupt_context() {
    let (mut rt, arch) = new_runtime(8);
    let seen: SeenLog = Arc::default();

    rt.add_module(
        ModuleDesc::new("echo", ModuleKind::Service).with_event_count(1),
        ModuleConfig::new().with_elements(vec![ElementDesc::new("e0")]),
        Box::new(Recorder::new(seen.clone(), Arc::default())),
    )
    .unwrap();
    rt.start().unwrap();

    let mut ev = Event::new(
        EntityId::event(0, 0),
        EntityId::module(0),
        EntityId::element(0, 0),
    );
    arch.in_interrupt(11, || rt.put_event(&mut ev)).unwrap();

    // Interrupt-context posts land on the isr queue, not the runnable one.
    assert_eq!(rt.isr_count(), 1);
    assert_eq!(rt.runnable_count(), 0);

    rt.process_event_queue();
    assert_eq!(seen.lock().unwrap().len(), 1);
    assert_eq!(rt.isr_count(), 0);
    assert_eq!(rt.free_count(), 8);
}

/// Fills in a per-element response marker for acknowledged notifications.
struct Subscriber {
    seen: SeenLog,
}

impl Module for Subscriber {
    fn init(
        &mut self,
        _fwk: &mut Runtime,
        _module_id: EntityId,
        _element_count: usize,
        _data: Option<&(dyn Any + Send + Sync)>,
    ) -> FwkResult {
        Ok(())
    }

    fn process_notification(
        &mut self,
        _fwk: &mut Runtime,
        event: &Event,
        response: &mut Event,
    ) -> FwkResult {
        self.seen.lock().unwrap().push(event.clone());
        if event.response_requested {
            response.set_params(&[event.target_id.element_idx() as u8])?;
        }
        Ok(())
    }
}

fn notifier_setup() -> (Runtime, SeenLog, SeenLog, Arc<Mutex<i32>>) {
    let (mut rt, _arch) = new_runtime(8);
    let notifier_seen: SeenLog = Arc::default();
    let subscriber_seen: SeenLog = Arc::default();
    let outstanding = Arc::new(Mutex::new(0));

    rt.add_module(
        ModuleDesc::new("power", ModuleKind::Service).with_notification_count(1),
        ModuleConfig::new().with_elements(vec![ElementDesc::new("domain0")]),
        Box::new(Recorder::new(notifier_seen.clone(), outstanding.clone())),
    )
    .unwrap();
    rt.add_module(
        ModuleDesc::new("listeners", ModuleKind::Driver),
        ModuleConfig::new().with_elements(vec![
            ElementDesc::new("a"),
            ElementDesc::new("b"),
            ElementDesc::new("c"),
        ]),
        Box::new(Subscriber {
            seen: subscriber_seen.clone(),
        }),
    )
    .unwrap();
    rt.start().unwrap();
    (rt, notifier_seen, subscriber_seen, outstanding)
}

const NOTIF: EntityId = EntityId::notification(0, 0);
const NOTIF_SRC: EntityId = EntityId::element(0, 0);

#[test]
fn test_notification_fanout_order_and_count() {
    let (mut rt, _, subscriber_seen, _) = notifier_setup();

    for e in 0..3 {
        rt.subscribe(NOTIF, NOTIF_SRC, EntityId::element(1, e)).unwrap();
    }
    assert_eq!(rt.notify_count(NOTIF, NOTIF_SRC), 3);

    let count = rt.notify(NOTIF, NOTIF_SRC, &[5], false).unwrap();
    assert_eq!(count, 3);
    assert_eq!(rt.runnable_count(), 3);

    rt.process_event_queue();

    let log = subscriber_seen.lock().unwrap();
    assert_eq!(log.len(), 3);
    for (i, event) in log.iter().enumerate() {
        assert!(event.is_notification);
        assert!(!event.is_response);
        assert_eq!(event.id, NOTIF);
        assert_eq!(event.source_id, NOTIF_SRC);
        // Fan-out in subscribe order.
        assert_eq!(event.target_id, EntityId::element(1, i));
        assert_eq!(event.params.as_slice(), &[5]);
    }
    assert_eq!(rt.free_count(), 8);
}

#[test]
fn test_notification_response_accounting() {
    let (mut rt, notifier_seen, _, outstanding) = notifier_setup();

    for e in 0..3 {
        rt.subscribe(NOTIF, NOTIF_SRC, EntityId::element(1, e)).unwrap();
    }
    let count = rt.notify(NOTIF, NOTIF_SRC, &[1], true).unwrap();
    assert_eq!(count, 3);
    *outstanding.lock().unwrap() = count as i32;
    assert_eq!(rt.pending_notification_responses(NOTIF, NOTIF_SRC), 3);

    rt.process_event_queue();

    // Each subscriber answered; the notifier's counter reached zero and no
    // acknowledgment is outstanding.
    assert_eq!(*outstanding.lock().unwrap(), 0);
    assert_eq!(rt.pending_notification_responses(NOTIF, NOTIF_SRC), 0);

    let responses = notifier_seen.lock().unwrap();
    assert_eq!(responses.len(), 3);
    let mut markers: Vec<u8> = responses.iter().map(|r| r.params[0]).collect();
    markers.sort_unstable();
    assert_eq!(markers, [0, 1, 2]);
    for r in responses.iter() {
        assert!(r.is_notification);
        assert!(r.is_response);
        assert_eq!(r.target_id, NOTIF_SRC);
    }
    assert_eq!(rt.free_count(), 8);
}

#[test]
fn test_notification_source_filter_and_wildcard() {
    let (mut rt, _, subscriber_seen, _) = notifier_setup();

    // One exact-source subscription, one wildcard.
    rt.subscribe(NOTIF, NOTIF_SRC, EntityId::element(1, 0)).unwrap();
    rt.subscribe(NOTIF, EntityId::none(), EntityId::element(1, 1))
        .unwrap();

    // From a different source of the same module only the wildcard fires.
    let count = rt
        .notify(NOTIF, EntityId::module(0), &[], false)
        .unwrap();
    assert_eq!(count, 1);
    rt.process_event_queue();
    assert_eq!(
        subscriber_seen.lock().unwrap()[0].target_id,
        EntityId::element(1, 1)
    );
}

#[test]
fn test_unsubscribe_then_subscribe_restores() {
    let (mut rt, _, _, _) = notifier_setup();
    let sub = EntityId::element(1, 0);

    rt.subscribe(NOTIF, NOTIF_SRC, sub).unwrap();
    assert_eq!(rt.subscribe(NOTIF, NOTIF_SRC, sub), Err(FwkError::State));

    rt.unsubscribe(NOTIF, NOTIF_SRC, sub).unwrap();
    assert_eq!(rt.unsubscribe(NOTIF, NOTIF_SRC, sub), Err(FwkError::Param));
    assert_eq!(rt.notify_count(NOTIF, NOTIF_SRC), 0);

    rt.subscribe(NOTIF, NOTIF_SRC, sub).unwrap();
    assert_eq!(rt.notify_count(NOTIF, NOTIF_SRC), 1);
}

/// API handed out by `Provider` at bind time.
struct TickApi {
    rate: u32,
}

struct Provider;

impl Module for Provider {
    fn init(
        &mut self,
        _fwk: &mut Runtime,
        _module_id: EntityId,
        _element_count: usize,
        _data: Option<&(dyn Any + Send + Sync)>,
    ) -> FwkResult {
        Ok(())
    }

    fn process_bind_request(
        &mut self,
        _source_id: EntityId,
        _target_id: EntityId,
        api_id: EntityId,
    ) -> FwkResult<modfwk::ApiHandle> {
        if api_id.api_idx() != 0 {
            return Err(FwkError::Param);
        }
        Ok(Arc::new(TickApi { rate: 100 }))
    }
}

/// Requests `TickApi` either during its bind hook (legal) or during its
/// start hook (must be denied).
struct Requester {
    bind_in_start: bool,
    got_rate: Arc<Mutex<Option<u32>>>,
    start_bind_error: Arc<Mutex<Option<FwkError>>>,
}

impl Module for Requester {
    fn init(
        &mut self,
        _fwk: &mut Runtime,
        _module_id: EntityId,
        _element_count: usize,
        _data: Option<&(dyn Any + Send + Sync)>,
    ) -> FwkResult {
        Ok(())
    }

    fn bind(&mut self, fwk: &mut Runtime, id: EntityId, round: u32) -> FwkResult {
        if self.bind_in_start || round != 0 || !id.is_kind(IdKind::Module) {
            return Ok(());
        }
        let api = fwk.bind(EntityId::module(1), EntityId::api(1, 0))?;
        let api = api.downcast::<TickApi>().map_err(|_| FwkError::Param)?;
        *self.got_rate.lock().unwrap() = Some(api.rate);
        Ok(())
    }

    fn start(&mut self, fwk: &mut Runtime, id: EntityId) -> FwkResult {
        if self.bind_in_start && id.is_kind(IdKind::Module) {
            match fwk.bind(EntityId::module(1), EntityId::api(1, 0)) {
                Ok(_) => {}
                Err(err) => *self.start_bind_error.lock().unwrap() = Some(err),
            }
        }
        Ok(())
    }
}

fn bind_setup(bind_in_start: bool) -> (Runtime, Arc<Mutex<Option<u32>>>, Arc<Mutex<Option<FwkError>>>) {
    let (mut rt, _arch) = new_runtime(4);
    let got_rate = Arc::new(Mutex::new(None));
    let start_bind_error = Arc::new(Mutex::new(None));

    rt.add_module(
        ModuleDesc::new("consumer", ModuleKind::Service),
        ModuleConfig::new(),
        Box::new(Requester {
            bind_in_start,
            got_rate: got_rate.clone(),
            start_bind_error: start_bind_error.clone(),
        }),
    )
    .unwrap();
    rt.add_module(
        ModuleDesc::new("ticker", ModuleKind::Hal).with_api_count(1),
        ModuleConfig::new(),
        Box::new(Provider),
    )
    .unwrap();
    rt.start().unwrap();
    (rt, got_rate, start_bind_error)
}

#[test]
fn test_bind_resolves_api() {
    let (rt, got_rate, _) = bind_setup(false);
    assert_eq!(*got_rate.lock().unwrap(), Some(100));
    assert_eq!(rt.bind_request_count(EntityId::module(1)).unwrap(), 1);
}

#[test]
fn test_bind_from_start_hook_denied() {
    let (rt, got_rate, start_bind_error) = bind_setup(true);
    assert_eq!(*got_rate.lock().unwrap(), None);
    assert_eq!(*start_bind_error.lock().unwrap(), Some(FwkError::AccessDenied));
    // The denied request left no trace on the target.
    assert_eq!(rt.bind_request_count(EntityId::module(1)).unwrap(), 0);
}

#[test]
fn test_pool_exhaustion() {
    let (mut rt, _, _, _) = recorder_responder_pair(2, false);

    let plain = || {
        Event::new(
            EntityId::event(1, 0),
            EntityId::element(0, 0),
            EntityId::element(1, 0),
        )
    };

    let mut first = plain();
    let mut second = plain();
    let mut third = plain();
    rt.put_event(&mut first).unwrap();
    rt.put_event(&mut second).unwrap();
    assert_eq!(rt.put_event(&mut third), Err(FwkError::NoMemory));

    assert_eq!(second.cookie, first.cookie + 1);
    assert_eq!(rt.runnable_count(), 2);
    assert_eq!(rt.free_count(), 0);

    rt.process_event_queue();
    assert_eq!(rt.free_count(), 2);

    // The failed attempt consumed no cookie: they advanced by exactly two.
    let mut fourth = plain();
    rt.put_event(&mut fourth).unwrap();
    assert_eq!(fourth.cookie, second.cookie + 1);
}

#[test]
fn test_descriptor_conservation_across_states() {
    let (mut rt, _, _, recorded) = recorder_responder_pair(8, true);
    let capacity = rt.event_capacity();

    let accounted = |rt: &Runtime| {
        rt.free_count()
            + rt.runnable_count()
            + rt.isr_count()
            + rt.delayed_count(EntityId::element(1, 0)).unwrap()
            + rt.delayed_count(EntityId::element(0, 0)).unwrap()
    };

    assert_eq!(accounted(&rt), capacity);

    let mut ev = request(&[1]);
    rt.put_event(&mut ev).unwrap();
    assert_eq!(accounted(&rt), capacity);

    rt.process_event_queue();
    // One descriptor is parked as a delayed response now.
    assert_eq!(rt.delayed_count(EntityId::element(1, 0)).unwrap(), 1);
    assert_eq!(accounted(&rt), capacity);

    let cookie = recorded.lock().unwrap().take().unwrap();
    let mut done = Event::new(
        EntityId::event(1, 0),
        EntityId::element(1, 0),
        EntityId::element(0, 0),
    );
    done.is_response = true;
    done.is_delayed_response = true;
    done.cookie = cookie;
    rt.put_event(&mut done).unwrap();
    assert_eq!(accounted(&rt), capacity);

    rt.process_event_queue();
    assert_eq!(rt.free_count(), capacity);
}
