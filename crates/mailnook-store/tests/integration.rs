//! End-to-end scenarios over a real maildir tree.

#![allow(clippy::unwrap_used)]

use std::fs;
use std::path::{Path, PathBuf};

use mailnook_store::{
    CUR_DIR, Context, Error, MAILDIR_SUBDIRS, Mailbox, Message, NEW_DIR, discover, is_mailbox,
};
use tempfile::TempDir;

const MULTIPART: &str = concat!(
    "From: Carol <carol@example.org>\r\n",
    "Subject: =?ISO-8859-1?Q?Caf=E9?= minutes\r\n",
    "Date: Mon, 3 Mar 2025 09:00:00 +0000\r\n",
    "MIME-Version: 1.0\r\n",
    "Content-Type: multipart/mixed; boundary=\"==sep==\"\r\n",
    "\r\n",
    "--==sep==\r\n",
    "Content-Type: multipart/alternative; boundary=alt\r\n",
    "\r\n",
    "--alt\r\n",
    "Content-Type: text/plain; charset=utf-8\r\n",
    "Content-Transfer-Encoding: quoted-printable\r\n",
    "\r\n",
    "Minutes attached =E2=80=94 see you.\r\n",
    "--alt\r\n",
    "Content-Type: text/html; charset=utf-8\r\n",
    "\r\n",
    "<p>Minutes attached</p>\r\n",
    "--alt--\r\n",
    "--==sep==\r\n",
    "Content-Type: text/plain; name=\"minutes.txt\"\r\n",
    "Content-Disposition: attachment; filename=\"minutes.txt\"\r\n",
    "Content-Transfer-Encoding: base64\r\n",
    "\r\n",
    "aXRlbSAxCml0ZW0gMgo=\r\n",
    "--==sep==--\r\n"
);

fn make_mailbox(path: &Path) {
    for sub in MAILDIR_SUBDIRS {
        fs::create_dir_all(path.join(sub)).unwrap();
    }
}

fn deliver(mailbox: &Path, sub: &str, name: &str, content: &str) -> PathBuf {
    let path = mailbox.join(sub).join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn discover_nested_mailboxes() {
    let tmp = TempDir::new().unwrap();
    let m = tmp.path().join("m");
    make_mailbox(&m.join("inbox"));
    make_mailbox(&m.join("inbox/archive"));
    fs::create_dir_all(m.join("notes")).unwrap();

    assert!(is_mailbox(&m.join("inbox")));
    assert!(!is_mailbox(&m.join("notes")));
    assert_eq!(discover(&m), vec![m.join("inbox"), m.join("inbox/archive")]);
}

#[test]
fn browse_and_read_a_mailbox() {
    let tmp = TempDir::new().unwrap();
    let inbox = tmp.path().join("inbox");
    make_mailbox(&inbox);
    deliver(&inbox, NEW_DIR, "1741000000.M1P1.host", MULTIPART);
    deliver(
        &inbox,
        CUR_DIR,
        "1740000000.M2P2.host:2,S",
        "Subject: old news\n\nread already\n",
    );

    let mailbox = Mailbox::open(&inbox).unwrap();
    let stats = mailbox.stats();
    assert_eq!((stats.total, stats.unread, stats.new), (2, 1, 1));

    let messages = mailbox.messages();
    assert_eq!(messages.len(), 2);

    let read = &messages[0];
    assert_eq!(read.subject(), Some("old news"));
    assert!(!read.is_unread());

    let fresh = &messages[1];
    assert!(fresh.is_new());
    assert_eq!(fresh.subject(), Some("Café minutes"));
    assert_eq!(fresh.from(), Some("Carol <carol@example.org>"));
    assert!(fresh.date().unwrap().is_some());

    let parts = fresh.parts();
    let types: Vec<_> = parts.iter().map(mailnook_store::MessagePart::content_type).collect();
    assert_eq!(types, vec!["text/plain", "text/html", "text/plain"]);
    assert_eq!(parts[0].text(), "Minutes attached \u{2014} see you.");

    let attachments: Vec<_> = fresh.attachments().collect();
    assert_eq!(attachments.len(), 1);
    assert_eq!(attachments[0].filename().as_deref(), Some("minutes.txt"));
    assert_eq!(attachments[0].content(true).as_ref(), b"item 1\nitem 2\n");
}

#[test]
fn flag_change_renames_on_disk() {
    let tmp = TempDir::new().unwrap();
    let inbox = tmp.path().join("inbox");
    make_mailbox(&inbox);
    let original = deliver(&inbox, CUR_DIR, "1234.host:2,S", "Subject: hi\n\nbody\n");

    let mut message = Message::new(&original);
    assert!(message.has_flag('S'));
    assert!(!message.has_flag('F'));

    assert!(message.add_flag('F').unwrap());
    assert_eq!(message.flags(), "FS");
    let renamed = inbox.join(CUR_DIR).join("1234.host:2,FS");
    assert_eq!(message.path(), renamed);
    assert!(renamed.is_file());
    assert!(!original.exists());

    // A fresh handle on the new path agrees with the old one
    let reopened = Message::new(&renamed);
    assert_eq!(reopened.flags(), "FS");
    assert_eq!(reopened.subject(), Some("hi"));
}

#[test]
fn invalid_flag_changes_nothing_on_disk() {
    let tmp = TempDir::new().unwrap();
    let inbox = tmp.path().join("inbox");
    make_mailbox(&inbox);
    let original = deliver(&inbox, CUR_DIR, "1.host:2,S", "Subject: hi\n\nbody\n");

    let mut message = Message::new(&original);
    assert!(matches!(message.add_flag('#'), Err(Error::InvalidFlag('#'))));
    assert!(original.is_file());
    assert_eq!(message.path(), original);
}

#[test]
fn stale_path_degrades() {
    let tmp = TempDir::new().unwrap();
    let inbox = tmp.path().join("inbox");
    make_mailbox(&inbox);
    let path = deliver(&inbox, CUR_DIR, "1.host:2,", "Subject: gone soon\n\nbody\n");

    let mut message = Message::new(&path);
    fs::remove_file(&path).unwrap();

    assert!(message.headers().is_empty());
    assert_eq!(message.header("subject"), None);
    assert!(message.parts().is_empty());

    // The handle still tracks flag changes
    assert!(message.add_flag('S').unwrap());
    assert_eq!(message.flags(), "S");
    assert!(!message.path().exists());
}

#[test]
fn mark_seen_moves_into_cur() {
    let tmp = TempDir::new().unwrap();
    let inbox = tmp.path().join("inbox");
    make_mailbox(&inbox);
    let path = deliver(&inbox, NEW_DIR, "77.host", "Subject: new\n\nbody\n");

    let mailbox = Mailbox::open(&inbox).unwrap();
    let mut messages = mailbox.messages();
    let message = &mut messages[0];
    assert!(message.is_new());

    message.mark_seen().unwrap();
    assert!(!path.exists());
    assert!(inbox.join(CUR_DIR).join("77.host:2,S").is_file());
    assert_eq!(mailbox.stats().new, 0);
    assert_eq!(mailbox.stats().unread, 0);
}

#[test]
fn detached_context_leaves_files_alone() {
    let tmp = TempDir::new().unwrap();
    let inbox = tmp.path().join("inbox");
    make_mailbox(&inbox);
    let path = deliver(&inbox, CUR_DIR, "5.host:2,", "Subject: x\n\nbody\n");

    let mut messages = Mailbox::open(&inbox)
        .unwrap()
        .messages_with(&Context::detached());
    messages[0].set_flags("RS").unwrap();

    assert_eq!(messages[0].flags(), "RS");
    assert!(path.is_file());
    assert!(!messages[0].path().exists());
}
