use pageflow::{ChannelEvent, ChannelOptions, EngineBuilder, PageModel, StateHost};

fn main() {
    let engine = EngineBuilder::new().build().unwrap();

    engine.launch();

    let text = include_str!("./page.json");

    let page_model = PageModel::from_json(text).unwrap();

    ChannelEvent::channel(engine.channel(), ChannelOptions::default()).on_event(move |e| {
        println!("[{}/{}] {:?}", e.owner, e.nid, e.event);
    });

    engine.load_page(page_model).unwrap();

    engine.dispatch("click", "cta-button").unwrap();

    let state = engine.state();
    loop {
        let preview = state.preview_state();
        if preview.items.get("reveal-box").is_some_and(|s| !s.is_visible) {
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(100));
    }

    println!("Preview: {:#?}", engine.state().preview_state());
    println!("Variables: {}", engine.state().variables());

    engine.shutdown();
}
