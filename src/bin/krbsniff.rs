use clap::Parser;
use krbsniff::{Frame, KrbError, KrbHandler, SnifferConfig};
use pcap_parser::pcapng::Block;
use pcap_parser::traits::PcapReaderIterator;
use pcap_parser::{Linktype, PcapBlockOwned, PcapError};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::EnvFilter;

const PCAP_BUFFER_SIZE: usize = 65536;

// BSD loopback, a four byte address family ahead of the IP header.
const NULL_HEADER_LEN: usize = 4;

#[derive(Debug, clap::Parser)]
#[clap(about = "Recover crackable AS-REQ pre-auth hashes from Kerberos captures")]
struct OptParser {
    /// Capture files to read, legacy pcap or pcapng.
    #[clap(required = true)]
    pcaps: Vec<PathBuf>,

    #[clap(short, long, env = "KRBSNIFF_CONFIG")]
    config: Option<PathBuf>,

    /// Overrides the kerberos port from the config.
    #[clap(short, long)]
    port: Option<u16>,

    /// Write hashes here instead of stdout.
    #[clap(short, long)]
    output: Option<PathBuf>,

    #[clap(short, long)]
    debug: bool,
}

/// Decapsulate one captured packet according to the link type of the
/// interface it was captured on.
fn frame_for_linktype(linktype: Linktype, data: &[u8]) -> Option<Frame> {
    if linktype == Linktype::ETHERNET {
        Frame::from_ethernet(data)
    } else if linktype == Linktype::RAW || linktype == Linktype::IPV4 || linktype == Linktype::IPV6
    {
        Frame::from_ip(data)
    } else if linktype == Linktype::NULL {
        data.get(NULL_HEADER_LEN..).and_then(Frame::from_ip)
    } else {
        None
    }
}

#[instrument(level = "debug", skip(handler))]
fn read_capture(path: &Path, handler: &KrbHandler) -> Result<usize, KrbError> {
    let file = File::open(path)?;
    let mut reader = pcap_parser::create_reader(PCAP_BUFFER_SIZE, file)?;

    // pcapng may describe several interfaces, packets refer to them by index.
    let mut interfaces: Vec<Linktype> = Vec::new();
    let mut packets = 0;

    loop {
        match reader.next() {
            Ok((offset, block)) => {
                let frame = match block {
                    PcapBlockOwned::LegacyHeader(header) => {
                        warn_unsupported(header.network);
                        interfaces = vec![header.network];
                        None
                    }
                    PcapBlockOwned::Legacy(packet) => {
                        packets += 1;
                        interfaces
                            .first()
                            .and_then(|linktype| frame_for_linktype(*linktype, packet.data))
                    }
                    PcapBlockOwned::NG(Block::SectionHeader(_)) => {
                        interfaces.clear();
                        None
                    }
                    PcapBlockOwned::NG(Block::InterfaceDescription(idb)) => {
                        warn_unsupported(idb.linktype);
                        interfaces.push(idb.linktype);
                        None
                    }
                    PcapBlockOwned::NG(Block::EnhancedPacket(epb)) => {
                        packets += 1;
                        interfaces
                            .get(epb.if_id as usize)
                            .and_then(|linktype| frame_for_linktype(*linktype, epb.data))
                    }
                    PcapBlockOwned::NG(Block::SimplePacket(spb)) => {
                        packets += 1;
                        interfaces
                            .first()
                            .and_then(|linktype| frame_for_linktype(*linktype, spb.data))
                    }
                    PcapBlockOwned::NG(_) => None,
                };

                if let Some(frame) = frame {
                    handler.handle_packet(&frame);
                }

                reader.consume(offset);
            }
            Err(PcapError::Eof) => break,
            Err(PcapError::Incomplete(_)) => {
                reader.refill()?;
            }
            Err(err) => {
                error!(?err, "unable to parse capture block");
                return Err(KrbError::PcapError);
            }
        }
    }

    Ok(packets)
}

fn warn_unsupported(linktype: Linktype) {
    let supported = [
        Linktype::ETHERNET,
        Linktype::RAW,
        Linktype::IPV4,
        Linktype::IPV6,
        Linktype::NULL,
    ];
    if !supported.contains(&linktype) {
        warn!(?linktype, "unsupported link type, packets on this interface are skipped");
    }
}

fn load_config(opt: &OptParser) -> Result<SnifferConfig, KrbError> {
    let mut config = match &opt.config {
        Some(path) => SnifferConfig::parse(path)?,
        None => SnifferConfig::default(),
    };

    if let Some(port) = opt.port {
        config.kerberos_port = port;
    }

    Ok(config)
}

fn write_hashes(hashes: &[Vec<u8>], output: Option<&Path>) -> Result<(), KrbError> {
    let mut out: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    for hash in hashes {
        out.write_all(hash)?;
        out.write_all(b"\n")?;
    }

    out.flush()?;
    Ok(())
}

fn main() -> Result<(), KrbError> {
    let opt = OptParser::parse();

    let filter = if opt.debug {
        EnvFilter::new("krbsniff=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("krbsniff=info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let config = load_config(&opt).inspect_err(|err| {
        error!(?err, "unable to load config");
    })?;
    debug!(?config);

    let handler = KrbHandler::new(&config);

    for path in &opt.pcaps {
        match read_capture(path, &handler) {
            Ok(packets) => info!(path = %path.display(), packets, "capture processed"),
            Err(err) => {
                error!(?err, path = %path.display(), "unable to read capture");
                return Err(err);
            }
        }
    }

    let hashes = handler.hash_lines();
    info!(
        requests = handler.len(),
        hashes = hashes.len(),
        "extraction complete"
    );

    write_hashes(&hashes, opt.output.as_deref())
}
