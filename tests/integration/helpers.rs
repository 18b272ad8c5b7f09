use guide_autoscroll::config::EngineConfig;
use guide_autoscroll::scroll::{
    AutoScrollEngine, Element, EngineEvent, GuideDom as _, ManualClock, MemoryDom, MemoryStore,
    NodeId, TimerQueue,
};
use std::time::Duration;

pub type TestEngine = AutoScrollEngine<MemoryDom, TimerQueue<ManualClock>, MemoryStore>;

pub const FRAME: Duration = Duration::from_millis(16);

/// A guide page: `body > #guideOuter > .guide-row*` plus an unrelated
/// element outside the scroll container.
pub struct Guide {
    pub dom: MemoryDom,
    pub outer: NodeId,
    pub rows: Vec<NodeId>,
    pub outside: NodeId,
}

fn build(rows: usize, row_height: f64, viewport: f64, label: impl Fn(usize) -> String) -> Guide {
    let mut dom = MemoryDom::new();
    let body = dom.body();
    let outside = dom.append(body, Element::new().class("site-header").height(60.0));
    let outer = dom.append(body, Element::new().id("guideOuter").viewport(viewport));
    let rows = (0..rows)
        .map(|i| {
            let row = dom.append(outer, Element::new().class("guide-row").height(row_height));
            let col = dom.append(row, Element::new().class("chan-col"));
            dom.append(col, Element::new().class("chan-name").text(&label(i)));
            row
        })
        .collect();
    Guide { dom, outer, rows, outside }
}

/// Rows with channel names filled in.
pub fn guide(rows: usize, row_height: f64, viewport: f64) -> Guide {
    build(rows, row_height, viewport, |i| format!("CH{i}"))
}

/// Rows still showing their loading placeholder.
pub fn loading_guide(rows: usize, row_height: f64, viewport: f64) -> Guide {
    build(rows, row_height, viewport, |_| "Loading…".to_owned())
}

pub fn engine(dom: MemoryDom, config: EngineConfig) -> TestEngine {
    engine_with_store(dom, MemoryStore::new(), config)
}

pub fn engine_with_store(dom: MemoryDom, store: MemoryStore, config: EngineConfig) -> TestEngine {
    let queue = TimerQueue::new(ManualClock::new(), config.frame_interval());
    AutoScrollEngine::new(dom, queue, store, config)
}

pub fn no_loop() -> EngineConfig {
    EngineConfig { loop_mode: false, ..EngineConfig::default() }
}

pub fn scroll_top(engine: &TestEngine, el: NodeId) -> f64 {
    engine.dom().scroll_top(el)
}

pub fn clone_count(engine: &TestEngine, el: NodeId) -> usize {
    engine.dom().query(Some(el), ".__auto_scroll_clone").len()
}

/// Advance frame by frame until `pred` matches an emitted event or `limit`
/// elapses. Returns every event seen on the way.
pub fn run_until<F>(engine: &mut TestEngine, limit: Duration, mut pred: F) -> Vec<EngineEvent>
where
    F: FnMut(&EngineEvent) -> bool,
{
    let mut seen = Vec::new();
    let mut elapsed = Duration::ZERO;
    while elapsed < limit {
        engine.advance(FRAME);
        elapsed += FRAME;
        let batch = engine.drain_events();
        let hit = batch.iter().any(&mut pred);
        seen.extend(batch);
        if hit {
            break;
        }
    }
    seen
}

pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}
