use bytes::Bytes;
use saltofi_rust::{
    block_archive, Attachment, Block, ElementView, Entity, FormValue, MultipartEncoder, SaltError,
    SubmissionClient, SubmissionConfig, GRB_TEMPLATE,
};
use std::io::{BufRead, BufReader, Cursor, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use zip::ZipArchive;

// A request as seen by the mock portal
struct CapturedRequest {
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl CapturedRequest {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

// One-shot HTTP server answering with `status` and `reply`
fn mock_portal(status: &'static str, reply: &'static str) -> (String, JoinHandle<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/portal", listener.local_addr().unwrap());

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());

        let mut request_line = String::new();
        reader.read_line(&mut request_line).unwrap();
        assert!(request_line.starts_with("POST /portal"));

        let mut headers = Vec::new();
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((k, v)) = line.split_once(':') {
                headers.push((k.trim().to_string(), v.trim().to_string()));
            }
        }

        let length: usize = headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
            .map(|(_, v)| v.parse().unwrap())
            .unwrap_or(0);
        let mut body = vec![0u8; length];
        reader.read_exact(&mut body).unwrap();

        let mut stream = stream;
        write!(
            stream,
            "HTTP/1.1 {}\r\nContent-Type: text/xml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            reply.len(),
            reply
        )
        .unwrap();
        stream.flush().unwrap();

        CapturedRequest { headers, body }
    });

    (url, handle)
}

fn config(url: String) -> SubmissionConfig {
    SubmissionConfig {
        portal_url: url,
        username: "U".to_string(),
        password: "P".to_string(),
        proposal_code: "2017-2-SCI-001".to_string(),
        ..SubmissionConfig::default()
    }
}

struct Part {
    name: String,
    file_name: Option<String>,
    data: Bytes,
}

async fn read_parts(content_type: &str, body: Vec<u8>) -> Vec<Part> {
    let boundary = multer::parse_boundary(content_type).unwrap();
    let stream =
        futures_util::stream::once(async move { Ok::<_, std::io::Error>(Bytes::from(body)) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut parts = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let data = field.bytes().await.unwrap();
        parts.push(Part {
            name,
            file_name,
            data,
        });
    }
    parts
}

fn read_parts_blocking(content_type: &str, body: Vec<u8>) -> Vec<Part> {
    tokio::runtime::Runtime::new()
        .unwrap()
        .block_on(read_parts(content_type, body))
}

fn text(part: &Part) -> &str {
    std::str::from_utf8(&part.data).unwrap()
}

#[tokio::test]
async fn test_multipart_body_parses_as_form_data() {
    let fields = vec![
        ("username".to_string(), FormValue::from("U")),
        ("blocksOnly".to_string(), FormValue::from(true)),
    ];
    let encoded = MultipartEncoder::new()
        .encode(&fields, &mut [Attachment::Bytes(b"PK\x03\x04 archive bytes")])
        .unwrap();
    let length = encoded.content_length();
    assert_eq!(length, encoded.body.len());

    let parts = read_parts(&encoded.content_type, encoded.body).await;
    assert_eq!(parts.len(), 3);
    assert_eq!((parts[0].name.as_str(), text(&parts[0])), ("username", "U"));
    assert_eq!((parts[1].name.as_str(), text(&parts[1])), ("blocksOnly", "true"));
    assert!(parts[2].name.starts_with("file_"));
    assert!(parts[2].name.ends_with("_0"));
    assert_eq!(
        parts[2].file_name.as_deref(),
        Some(format!("{}.zip", parts[2].name).as_str())
    );
    assert_eq!(&parts[2].data[..], b"PK\x03\x04 archive bytes");
}

#[tokio::test]
async fn test_path_attachment_is_read_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"zip on disk").unwrap();

    let encoded = MultipartEncoder::new()
        .encode(&[], &mut [Attachment::Path(file.path())])
        .unwrap();
    let parts = read_parts(&encoded.content_type, encoded.body).await;
    assert_eq!(parts.len(), 1);
    assert_eq!(&parts[0].data[..], b"zip on disk");
}

#[test]
fn test_missing_path_attachment_is_unsupported() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.zip");
    let result = MultipartEncoder::new().encode(&[], &mut [Attachment::Path(&missing)]);
    assert!(matches!(result, Err(SaltError::UnsupportedAttachmentType(_))));
}

#[test]
fn test_submit_block_sends_archive_and_returns_code() {
    let (url, server) = mock_portal("200 OK", "<Response><Status>ok</Status></Response>");
    let client = SubmissionClient::new(config(url)).unwrap();
    let doc = ElementView::parse(GRB_TEMPLATE).unwrap();

    let receipt = client.submit_block(&doc).unwrap();
    assert_eq!(receipt.block_code, "template");

    let request = server.join().unwrap();
    assert_eq!(
        request.header("content-length"),
        Some(request.body.len().to_string().as_str())
    );
    let content_type = request.header("content-type").unwrap().to_string();
    assert!(content_type.starts_with("multipart/form-data; boundary="));

    let parts = read_parts_blocking(&content_type, request.body);
    let names: Vec<&str> = parts.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(
        &names[..10],
        &[
            "username",
            "password",
            "method",
            "asyncCode",
            "proposalCode",
            "emails",
            "retainProposalStatus",
            "semester",
            "noValidation",
            "blocksOnly",
        ]
    );
    assert_eq!(text(&parts[0]), "VQ==");
    assert_eq!(text(&parts[1]), "UA==");
    assert_eq!(text(&parts[2]), "sendProposal");
    assert_eq!(text(&parts[3]), "");
    assert_eq!(text(&parts[7]), "2017-2");
    assert_eq!(text(&parts[9]), "true");

    assert_eq!(parts.len(), 11);
    let mut archive = ZipArchive::new(Cursor::new(parts[10].data.to_vec())).unwrap();
    assert_eq!(archive.len(), 1);
    let mut xml = String::new();
    archive
        .by_name("Block.xml")
        .unwrap()
        .read_to_string(&mut xml)
        .unwrap();
    let sent = ElementView::parse(xml.as_bytes()).unwrap();
    assert_eq!(
        sent.block().get(&sent, &Block::CODE).unwrap(),
        "template"
    );
}

#[test]
fn test_error_envelope_is_server_error() {
    let (url, server) = mock_portal(
        "200 OK",
        "<?xml version=\"1.0\"?><Response><Error>Invalid proposal code</Error></Response>",
    );
    let client = SubmissionClient::new(config(url)).unwrap();

    let archive = block_archive(b"<Block/>").unwrap();
    match client.submit_archive(&archive) {
        Err(SaltError::ServerError(message)) => assert_eq!(message, "Invalid proposal code"),
        other => panic!("expected a server error, got {:?}", other),
    }
    server.join().unwrap();
}

#[test]
fn test_non_xml_failure_reports_status() {
    let (url, server) = mock_portal("500 Internal Server Error", "oops");
    let client = SubmissionClient::new(config(url)).unwrap();

    match client.submit_archive(b"PK") {
        Err(SaltError::ServerError(message)) => assert!(message.contains("500")),
        other => panic!("expected a server error, got {:?}", other),
    }
    server.join().unwrap();
}
