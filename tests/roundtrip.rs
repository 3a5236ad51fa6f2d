use std::fs::File;

use pretty_assertions::assert_eq;
use xml_nav::{
    Emitter, EmitterConfig, Integer, Local, Navigator, PullSource, PushSink, QName, Qualified,
    Writer,
};

type Snapshot = Vec<(String, Vec<(String, String)>, String)>;

fn snapshot<S: PullSource>(nav: &mut Navigator<Qualified, S>, out: &mut Snapshot) {
    let attributes = nav
        .attributes()
        .map(|(parts, value)| {
            let key = match parts.namespace {
                Some(ns) => format!("{{{}}}{}", ns, parts.local),
                None => parts.local.to_owned(),
            };
            (key, value.to_owned())
        })
        .collect();
    let name = nav.name().to_string();
    let content = nav.content().unwrap().trim().to_owned();
    out.push((name, attributes, content));

    if nav.child(None).unwrap() {
        loop {
            snapshot(nav, out);
            if !nav.sibling(None).unwrap() {
                break;
            }
        }
        assert!(nav.parent());
    }
}

fn copy<S: PullSource, K: PushSink>(
    nav: &mut Navigator<Qualified, S>,
    writer: &mut Writer<Qualified, K>,
) -> xml_nav::Result<()> {
    writer.write_start_element(nav.name())?;
    for (prefix, uri) in nav.namespaces() {
        writer.write_namespace(prefix, uri)?;
    }
    for (parts, value) in nav.attributes() {
        match parts.namespace {
            Some(ns) => {
                let key = QName::with_prefix(ns, parts.local, parts.prefix.unwrap_or(""));
                writer.write_attribute(&key, value)?;
            }
            None => {
                writer.write_attribute(parts.local, value)?;
            }
        }
    }
    let text = nav.content()?;
    if !text.is_empty() {
        writer.write_content(text)?;
    }

    if nav.child(None)? {
        loop {
            copy(nav, writer)?;
            if !nav.sibling(None)? {
                break;
            }
        }
        nav.parent();
    }
    writer.write_end_element()?;
    Ok(())
}

fn books() -> Navigator<Qualified, xml_nav::XmlSource<File>> {
    let f = File::open("./tests/xml_files/books.xml").unwrap();
    Navigator::from_reader(Qualified, f).unwrap()
}

#[test]
fn copied_document_reads_back_the_same() {
    let mut expected = vec![];
    snapshot(&mut books(), &mut expected);

    let mut writer = Writer::from_writer(Qualified, Vec::new());
    copy(&mut books(), &mut writer).unwrap();
    writer.finish().unwrap();
    let bytes = writer.into_sink().into_inner();

    let mut copied = vec![];
    let mut nav = Navigator::from_reader(Qualified, &bytes[..]).unwrap();
    snapshot(&mut nav, &mut copied);

    assert_eq!(copied, expected);
    assert_eq!(copied.len(), 19);
    assert_eq!(
        copied[2],
        ("{urn:books}author".to_owned(), vec![], "Gambardella, Matthew".to_owned())
    );
}

#[test]
fn pretty_document() {
    let emitter = Emitter::with_config(Vec::new(), EmitterConfig::pretty(2));
    let mut writer = Writer::new(Local, emitter);
    writer
        .write_start_element(&"order".to_owned())
        .unwrap()
        .write_attribute_as("id", &Integer, &7)
        .unwrap()
        .write_element(&"item".to_owned(), "tea")
        .unwrap()
        .write_element(&"item".to_owned(), "milk & honey")
        .unwrap()
        .write_start_element(&"note".to_owned())
        .unwrap();
    writer.finish().unwrap();

    let text = String::from_utf8(writer.into_sink().into_inner()).unwrap();
    assert_eq!(
        text,
        "<?xml version=\"1.0\"?>\n\
         <order id=\"7\">\n  \
         <item>tea</item>\n  \
         <item>milk &amp; honey</item>\n  \
         <note/>\n\
         </order>\n"
    );

    let mut nav = Navigator::from_text(Local, &text).unwrap();
    assert_eq!(nav.attribute_as("id", &Integer).unwrap(), Some(7));
    assert!(nav.child(None).unwrap());
    assert!(nav.sibling(None).unwrap());
    assert_eq!(nav.content().unwrap(), "milk & honey");
    assert!(nav.sibling(None).unwrap());
    assert_eq!(nav.name(), "note");
    assert_eq!(nav.content().unwrap(), "");
}

#[test]
fn repaired_namespaces_read_back() {
    let mut writer = Writer::from_writer(Qualified, Vec::new());
    let id = QName::new(Some("urn:meta"), "id");
    writer
        .write_start_element(&QName::with_prefix("urn:shop", "order", "s"))
        .unwrap()
        .write_attribute(&id, "A-1")
        .unwrap()
        .write_element(&QName::new(Some("urn:shop"), "line"), "1")
        .unwrap()
        .write_element(&QName::local_only("free"), "2")
        .unwrap();
    writer.finish().unwrap();
    let bytes = writer.into_sink().into_inner();

    let mut nav = Navigator::from_reader(Qualified, &bytes[..]).unwrap();
    assert_eq!(nav.name(), &QName::new(Some("urn:shop"), "order"));
    assert_eq!(nav.name().prefix(), Some("s"));
    assert_eq!(nav.attribute(&id), Some("A-1"));
    assert!(nav.child(Some(&QName::new(Some("urn:shop"), "line"))).unwrap());
    assert!(nav.sibling(Some(&QName::local_only("free"))).unwrap());
    assert_eq!(nav.name().namespace(), None);
}

#[test]
fn rejected_writes_keep_the_output_well_formed() {
    let mut writer = Writer::from_writer(Local, Vec::new());
    writer
        .write_start_element(&"a".to_owned())
        .unwrap()
        .write_attribute("x", "1")
        .unwrap();
    assert!(writer.write_attribute("x", "2").is_err());
    writer.finish().unwrap();

    let text = String::from_utf8(writer.into_sink().into_inner()).unwrap();
    assert_eq!(text, "<?xml version=\"1.0\"?><a x=\"1\"></a>");
    let nav = Navigator::from_text(Local, &text).unwrap();
    assert_eq!(nav.attribute("x"), Some("1"));

    let mut writer = Writer::from_writer(Local, Vec::new());
    assert!(matches!(
        writer.write_element(&"a".to_owned(), "bell\u{7}"),
        Err(xml_nav::Error::Stream(_))
    ));
}
