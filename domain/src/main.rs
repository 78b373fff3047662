use std::env;
use std::process;
use std::sync::Arc;

use domain::adapters::memory_store::InMemoryStore;
use domain::form::LinkEditor;
use domain::id::Base62IdGenerator;
use domain::render::{render_panel, IconView, PanelBody};
use domain::validate::classify_url;
use domain::{IconType, LinkList, PropertyStore};

fn print_usage() {
    eprintln!(
        "{}\n\nUsage:\n  domain classify <value>...\n  domain add <title> <url> [--icon <name>] [--custom-icon <url>] [--same-tab]\n\nNotes:\n  - `classify` exits with status 1 if any value is rejected.\n  - `add` uses an in-memory store; data is not persisted across runs.",
        domain::about()
    );
}

fn classify(values: Vec<String>) -> Result<(), String> {
    if values.is_empty() {
        return Err("missing <value> for classify".into());
    }
    let mut rejected = 0;
    for value in &values {
        match classify_url(value) {
            Ok(url) => println!("accepted: {:?} -> {:?}", value, url),
            Err(reason) => {
                rejected += 1;
                println!("rejected: {:?} ({})", value, reason);
            }
        }
    }
    if rejected > 0 {
        return Err(format!("{} of {} values rejected", rejected, values.len()));
    }
    Ok(())
}

fn add(args: Vec<String>) -> Result<(), String> {
    let mut args = args.into_iter();
    let Some(title) = args.next() else {
        return Err("missing <title> for add".into());
    };
    let Some(url) = args.next() else {
        return Err("missing <url> for add".into());
    };

    let store = Arc::new(InMemoryStore::new());
    let sink = Arc::clone(&store);
    let observer = move |links: &LinkList| {
        if let Err(e) = sink.save_links(links) {
            eprintln!("save failed: {}", e);
        }
    };
    let mut editor = LinkEditor::new(Vec::new(), Base62IdGenerator::new(4), observer)
        .map_err(|e| format!("editor init failed: {}", e))?;
    editor.set_title(&title);
    editor.set_url(&url);

    // Parse simple flags: --icon <name>, --custom-icon <url>, --same-tab
    let rest: Vec<String> = args.collect();
    let mut i = 0;
    while i < rest.len() {
        match rest[i].as_str() {
            "--icon" | "--custom-icon" => {
                if i + 1 >= rest.len() {
                    return Err(format!("{} requires a value", rest[i]));
                }
                if rest[i] == "--custom-icon" {
                    editor.set_icon_type(IconType::Custom);
                }
                editor.set_icon(&rest[i + 1]);
                i += 2;
            }
            "--same-tab" => {
                editor.set_open_in_new_tab(false);
                i += 1;
            }
            unk => return Err(format!("unknown argument: {}", unk)),
        }
    }

    if let Some(warning) = editor.icon_warning() {
        eprintln!("warning: custom icon rejected ({}); default icon will be shown", warning);
    }
    let id = editor.submit().map_err(|e| match e {
        domain::CoreError::InvalidUrl(reason) => {
            format!("add failed: {}", reason.message().unwrap_or("invalid url"))
        }
        other => format!("add failed: {}", other),
    })?;

    let props = store.load().map_err(|e| e.to_string())?;
    println!("added: {} ({} links stored)", id, props.links.len());

    let view = render_panel("Quick Links", editor.links());
    if let PanelBody::Links(links) = view.body {
        for link in links {
            let icon = match link.icon {
                IconView::Fluent { name } => format!("icon {}", name),
                IconView::Image { src, .. } => format!("image {}", src),
            };
            println!(
                "  {} -> {} [{}] {}",
                link.aria_label,
                link.href,
                link.target.as_attr(),
                icon
            );
        }
    }
    Ok(())
}

fn run() -> Result<(), String> {
    let mut args = env::args().skip(1); // skip program name

    let Some(cmd) = args.next() else {
        print_usage();
        return Ok(());
    };

    match cmd.as_str() {
        "classify" => classify(args.collect()),
        "add" => add(args.collect()),
        _ => {
            print_usage();
            Ok(())
        }
    }
}

fn main() {
    if let Err(msg) = run() {
        eprintln!("error: {}", msg);
        process::exit(1);
    }
}
