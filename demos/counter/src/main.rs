//! Reads button ids (`inc`, `dec`, `reset`) from stdin, one per line, clicks
//! them and prints the rendered markup. An empty line or EOF quits.

use std::io::BufRead;

use hookcls::prelude::*;

render_affecting! {
    pub struct CounterFields {
        count: i32 = 0,
    }
}

#[derive(Props, Clone, PartialEq)]
pub struct CounterProps {
    #[prop(default)]
    pub label: String,
    #[prop(default = 1)]
    pub step: i32,
}

#[derive(Default)]
struct Counter;

impl Component for Counter {
    type Props = CounterProps;
    type Fields = CounterFields;

    fn default_props() -> CounterPropsDefaults {
        CounterPropsDefaults {
            label: Some("Count".to_string()),
            ..Default::default()
        }
    }

    fn render(&mut self, cx: &RenderCx<'_, Self>, props: &CounterProps) -> Option<Node> {
        let count = cx.get(CounterFields::count);
        let step = props.step;
        let button = |id: &str, text: &str, f: fn(i32, i32) -> i32| {
            let this = cx.instance();
            Node::element("button")
                .id(id)
                .on("click", move |_| {
                    this.update(CounterFields::count, |c| *c = f(*c, step));
                })
                .child(text)
        };
        Some(
            Node::element("div")
                .child(Node::element("span").child(format!("{}: {count}", props.label)))
                .child(button("inc", "+", |c, s| c + s))
                .child(button("dec", "-", |c, s| c - s))
                .child(button("reset", "0", |_, _| 0)),
        )
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let counter = create_component::<Counter>();
    let handle = HandleRef::new();
    let mut host = Host::new();
    host.render(counter.element_with_handle(
        CounterPropsInput {
            label: None,
            step: None,
        },
        &handle,
    ))?;
    println!("{}", host.output());

    for line in std::io::stdin().lock().lines() {
        let line = line?;
        let target = line.trim();
        if target.is_empty() {
            break;
        }
        match host.dispatch(target, Event::new("click")) {
            Ok(report) => log::debug!("{target}: {} render(s)", report.rendered),
            Err(e) => log::warn!("{e}"),
        }
        println!("{}", host.output());
    }

    // A late callback after teardown is ignored.
    let stray = handle.get();
    host.unmount();
    if let Some(stray) = stray {
        stray.update(CounterFields::count, |c| *c += 1);
        log::info!("stray update after unmount scheduled: {}", stray.request_update());
    }
    Ok(())
}
