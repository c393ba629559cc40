use std::io::Cursor;

use binrw::BinWrite;
use fat::Layout;
use fat::volume::data::DirEntry;
use fat::volume::reserved::Bpb;

#[test]
fn volume() {
    let layout = Layout::new(8 * 1024 * 1024).unwrap();

    let mut cursor = Cursor::new(Vec::new());
    Bpb::new(&layout).write(&mut cursor).unwrap();
    assert_eq!(512, cursor.get_ref().len());

    let mut cursor = Cursor::new(Vec::new());
    DirEntry::default().write(&mut cursor).unwrap();
    assert_eq!(32, cursor.get_ref().len());
}
