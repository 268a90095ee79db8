//! MJPEG ストリームからフレームを取り出してファイルに保存する例
//!
//! 使い方:
//!   cargo run -p mjpeg_dump -- http://192.168.0.10:8080/stream
//!   cargo run -p mjpeg_dump -- http://localhost:8080/video --output-dir frames --max-frames 100

use std::path::PathBuf;
use std::time::Duration;

use shiguredo_http11::{
    BodyKind, BodyProgress, DecoderLimits as HttpLimits, Request, ResponseDecoder, ResponseHead,
};
use shiguredo_mjpeg::MjpegDecoder;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_mjpeg::FrameReader;
use tracing::info;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// HTTP ボディを MJPEG デコーダーに渡すパイプのバッファサイズ
const BODY_PIPE_SIZE: usize = 64 * 1024;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let mut args = noargs::raw_args();
    args.metadata_mut().app_name = "mjpeg_dump";

    // --help フラグ
    noargs::HELP_FLAG.take_help(&mut args);

    // --version フラグ
    let version_flag: bool = noargs::flag("version")
        .short('V')
        .doc("Show version")
        .take(&mut args)
        .is_present();
    if version_flag {
        println!("{}", env!("CARGO_PKG_VERSION"));
        std::process::exit(0);
    }

    // --output-dir オプション
    let output_dir: PathBuf = noargs::opt("output-dir")
        .short('o')
        .doc("Directory to write frames to (default: .)")
        .default(".")
        .take(&mut args)
        .then(|o| Ok::<_, &str>(PathBuf::from(o.value())))
        .map_err(|e| format!("{:?}", e))?;

    // --max-frames オプション
    let max_frames: u64 = noargs::opt("max-frames")
        .short('n')
        .doc("Stop after this many frames (default: 0, unlimited)")
        .default("0")
        .take(&mut args)
        .then(|o| o.value().parse())
        .map_err(|e| format!("{:?}", e))?;

    // 位置引数: URL
    let url: String = noargs::arg("<URL>")
        .doc("MJPEG stream URL (e.g., http://localhost:8080/stream)")
        .take(&mut args)
        .then(|a| Ok::<_, &str>(a.value().to_string()))
        .map_err(|e| format!("{:?}", e))?;

    // 未知の引数があればエラー、ヘルプが返されたら表示
    if let Some(help) = args.finish().map_err(|e| format!("{:?}", e))? {
        print!("{}", help);
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let (host, port, path) = parse_url(&url)?;
    info!(%host, port, %path, "connecting");

    let mut stream = TcpStream::connect((host.as_str(), port)).await?;
    let user_agent = format!("mjpeg_dump/{}", env!("CARGO_PKG_VERSION"));
    let request = Request::new("GET", &path)
        .header("Host", &host)
        .header("User-Agent", &user_agent)
        .header("Accept", "*/*")
        .header("Connection", "close");
    stream.write_all(&request.encode()).await?;

    // MJPEG ストリームは終わらないのでボディサイズは制限しない
    let mut http = ResponseDecoder::with_limits(HttpLimits {
        max_body_size: usize::MAX,
        ..HttpLimits::default()
    });
    let (head, body_kind) = read_response_head(&mut stream, &mut http).await?;
    if !(200..300).contains(&head.status_code) {
        return Err(format!(
            "unexpected status: {} {}",
            head.status_code, head.reason_phrase
        )
        .into());
    }
    if matches!(body_kind, BodyKind::None | BodyKind::Tunnel) {
        return Err("response has no body".into());
    }
    info!(status = head.status_code, ?body_kind, "stream opened");

    // chunked などの転送符号化を外したボディだけを MJPEG デコーダーに渡す
    let (body_writer, body_reader) = tokio::io::duplex(BODY_PIPE_SIZE);
    let pump = tokio::spawn(pump_body(stream, http, body_writer));

    let mut reader = FrameReader::with_decoder(body_reader, MjpegDecoder::new())
        .read_timeout(Duration::from_secs(30));

    tokio::fs::create_dir_all(&output_dir).await?;

    let mut written = 0;
    let mut reached_limit = false;
    while let Some(frame) = reader.next_frame().await? {
        let path = output_dir.join(format!("frame-{:06}.jpg", frame.sequence() + 1));
        tokio::fs::write(&path, frame.data()).await?;
        info!(path = %path.display(), len = frame.len(), "frame written");

        written += 1;
        if max_frames > 0 && written >= max_frames {
            reached_limit = true;
            break;
        }
    }

    let stats = reader.decoder().stats();
    info!(
        written,
        dropped = stats.frames_dropped,
        bytes = stats.bytes,
        "done"
    );

    if reached_limit {
        pump.abort();
    } else {
        pump.await??;
    }

    Ok(())
}

/// `http://host[:port][/path]` を分解する
fn parse_url(url: &str) -> Result<(String, u16, String), BoxError> {
    let Some(rest) = url.strip_prefix("http://") else {
        return Err("URL must start with http://".into());
    };

    let (host_port, path) = match rest.find('/') {
        Some(i) => (&rest[..i], &rest[i..]),
        None => (rest, "/"),
    };

    let (host, port) = match host_port.find(':') {
        Some(i) => {
            let port: u16 = host_port[i + 1..].parse()?;
            (&host_port[..i], port)
        }
        None => (host_port, 80),
    };
    if host.is_empty() {
        return Err("URL must have a host".into());
    }

    Ok((host.to_string(), port, path.to_string()))
}

/// レスポンスヘッダーをデコードする
///
/// ヘッダーと一緒に読み込んだボディの先頭は `http` に残る。
async fn read_response_head<R: AsyncRead + Unpin>(
    reader: &mut R,
    http: &mut ResponseDecoder,
) -> Result<(ResponseHead, BodyKind), BoxError> {
    let mut buf = [0u8; 8192];
    loop {
        if let Some(head) = http.decode_headers()? {
            return Ok(head);
        }

        let n = reader.read(&mut buf).await?;
        if n == 0 {
            return Err("connection closed before response head".into());
        }
        http.feed(&buf[..n])?;
    }
}

/// レスポンスボディを読み込み、転送符号化を外して `writer` に書き込む
///
/// ボディが終わるか接続が閉じられたら戻る。
async fn pump_body<R, W>(
    mut reader: R,
    mut http: ResponseDecoder,
    mut writer: W,
) -> Result<(), BoxError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = [0u8; 8192];
    loop {
        if drain_body(&mut http, &mut writer).await? {
            break;
        }

        let n = reader.read(&mut buf).await?;
        if n == 0 {
            http.mark_eof();
            info!("connection closed");
            break;
        }
        http.feed(&buf[..n])?;
    }
    writer.shutdown().await?;
    Ok(())
}

/// バッファ済みのボディをすべて書き出す。ボディが終わったら true を返す
async fn drain_body<W: AsyncWrite + Unpin>(
    http: &mut ResponseDecoder,
    writer: &mut W,
) -> Result<bool, BoxError> {
    loop {
        if let Some(body) = http.peek_body() {
            writer.write_all(body).await?;
            let len = body.len();
            if let BodyProgress::Complete { .. } = http.consume_body(len)? {
                return Ok(true);
            }
            continue;
        }

        let buffered = http.remaining().len();
        if let BodyProgress::Complete { .. } = http.progress()? {
            return Ok(true);
        }
        // チャンクサイズ行などがまだ揃っていない
        if http.peek_body().is_none() && http.remaining().len() == buffered {
            return Ok(false);
        }
    }
}
